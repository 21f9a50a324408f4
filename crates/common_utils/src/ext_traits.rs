//! Small extension traits used at validation call sites all over `router`,
//! mirroring the teacher's `utils::OptionExt` / `ValueExt`.

use error_stack::{report, ResultExt};
use serde::de::DeserializeOwned;

use crate::errors::{CustomResult, MissingRequiredField, ParsingError};

pub trait OptionExt<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, MissingRequiredField>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, MissingRequiredField> {
        self.ok_or_else(|| report!(MissingRequiredField(field_name)))
    }
}

/// Parses a `serde_json::Value` into a strongly typed struct, attaching a
/// readable error instead of propagating `serde_json::Error` bare.
pub trait ValueExt {
    fn parse_value<T: DeserializeOwned>(self, type_name: &'static str) -> CustomResult<T, ParsingError>;
}

impl ValueExt for serde_json::Value {
    fn parse_value<T: DeserializeOwned>(self, type_name: &'static str) -> CustomResult<T, ParsingError> {
        serde_json::from_value(self)
            .change_context(ParsingError {
                expected: type_name,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_required_value_fails_on_none() {
        let value: Option<u64> = None;
        assert!(value.get_required_value("amount").is_err());
    }

    #[test]
    fn get_required_value_succeeds_on_some() {
        let value = Some(42u64);
        assert_eq!(value.get_required_value("amount").unwrap(), 42);
    }
}
