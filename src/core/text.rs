//! MK-003: Text conversion for field values.
//!
//! Integers use base-10 with full-range semantics per width. Floats use the
//! shortest representation that parses back to the same value.

use super::error::TextError;

/// Conversion between a field value and its text inside an encoded key.
///
/// Implement this for your own types to control their text form. The
/// implementation must satisfy `from_text(&to_text()?) == value`.
pub trait KeyText: Sized {
    fn to_text(&self) -> Result<String, TextError>;

    fn from_text(text: &str) -> Result<Self, TextError>;

    /// Name used in error messages.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl KeyText for String {
    fn to_text(&self) -> Result<String, TextError> {
        Ok(self.clone())
    }

    fn from_text(text: &str) -> Result<Self, TextError> {
        Ok(text.to_string())
    }

    fn type_name() -> &'static str {
        "string"
    }
}

macro_rules! int_key_text {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyText for $t {
                fn to_text(&self) -> Result<String, TextError> {
                    Ok(self.to_string())
                }

                fn from_text(text: &str) -> Result<Self, TextError> {
                    text.parse::<$t>().map_err(|source| TextError::Integer {
                        text: text.to_string(),
                        source,
                    })
                }

                fn type_name() -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

macro_rules! float_key_text {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyText for $t {
                fn to_text(&self) -> Result<String, TextError> {
                    Ok(self.to_string())
                }

                fn from_text(text: &str) -> Result<Self, TextError> {
                    text.parse::<$t>().map_err(|source| TextError::Float {
                        text: text.to_string(),
                        source,
                    })
                }

                fn type_name() -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

int_key_text!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
float_key_text!(f32, f64);
