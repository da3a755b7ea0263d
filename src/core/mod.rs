//! Core codec logic: instruction parsing, plan resolution, schemas, encode and decode.

pub mod codec;
pub mod dynamic;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod text;
pub mod types;
