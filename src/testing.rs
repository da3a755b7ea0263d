//! MK-010: Assertions for downstream test suites.
//!
//! Both helpers go through the full storage path: encode, wrap, JSON,
//! unwrap, decode into a fresh default value, compare.

use crate::core::schema::Record;
use crate::envelope::{
    marshal_fields, unmarshal_fields, AttributeValue, MarshalAttributeValue, MultiKey,
    UnmarshalAttributeValue,
};
use std::fmt::Debug;

/// Assert that `input` survives a round trip through the envelope under `tag`.
#[track_caller]
pub fn assert_symmetrical<T>(input: &T, tag: &str)
where
    T: Record + Default + PartialEq + Debug,
{
    let av = marshal_fields(input, tag).unwrap_or_else(|e| {
        panic!(
            "{} failed to marshal to attribute value\n\ninput:\n\t{}\n\nerror:\n\t{}",
            std::any::type_name::<T>(),
            yellow(&format!("{:?}", input)),
            red(&e.to_string())
        )
    });
    let av = through_json(&av);

    let mut output = T::default();
    if let Err(e) = unmarshal_fields(&mut output, tag, &av) {
        panic!(
            "failed to unmarshal from attribute value {:?}: {}",
            av,
            red(&e.to_string())
        );
    }

    assert_eq!(
        &output,
        input,
        "{} is not symmetrical",
        std::any::type_name::<T>()
    );
}

/// Assert that a [`MultiKey`] survives a round trip through its marshaller.
#[track_caller]
pub fn assert_symmetrical_multi_key<T>(input: &MultiKey<T>)
where
    T: Record + Default + PartialEq + Debug,
{
    let av = input.marshal_attribute_value().unwrap_or_else(|e| {
        panic!(
            "{:?} failed to marshal to attribute value: {}",
            input,
            red(&e.to_string())
        )
    });
    let av = through_json(&av);

    let mut output = MultiKey::new(T::default(), input.tag.clone());
    if let Err(e) = output.unmarshal_attribute_value(&av) {
        panic!(
            "failed to unmarshal from attribute value {:?}: {}",
            av,
            red(&e.to_string())
        );
    }

    assert_eq!(&output, input, "multi key is not symmetrical");
}

#[track_caller]
fn through_json(av: &AttributeValue) -> AttributeValue {
    let json = av
        .to_json()
        .unwrap_or_else(|e| panic!("attribute value did not serialize: {}", e));
    AttributeValue::from_json(&json)
        .unwrap_or_else(|e| panic!("attribute value did not deserialize from {}: {}", json, e))
}

fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}

fn yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}
