//! Builders for wire requests.

use std::path::Path;

use filebroker_protocol::{
    ARGUMENTS_KEY, FILE_OPERATION_ARGUMENT, FILEOP_KEY, REQUEST_ID_KEY, Value, ValueSet,
};

/// A `FileOperation` request for `fileop` carrying the given payload fields.
#[must_use]
pub fn file_operation<I, K, V>(fileop: &str, fields: I) -> ValueSet
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut set = ValueSet::new()
        .with(ARGUMENTS_KEY, FILE_OPERATION_ARGUMENT)
        .with(FILEOP_KEY, fileop);
    for (key, value) in fields {
        set.insert(key, value);
    }
    set
}

/// Attach a `RequestID` to a request.
#[must_use]
pub fn with_request_id(set: ValueSet, request_id: &str) -> ValueSet {
    set.with(REQUEST_ID_KEY, request_id)
}

/// Path value as it travels on the wire.
#[must_use]
pub fn path_value(path: &Path) -> Value {
    Value::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_envelope_fields() {
        let set = with_request_id(
            file_operation("DeleteItem", [("filepath", Value::from("/tmp/x"))]),
            "r1",
        );
        assert_eq!(set.get(ARGUMENTS_KEY).and_then(Value::as_str), Some("FileOperation"));
        assert_eq!(set.get(FILEOP_KEY).and_then(Value::as_str), Some("DeleteItem"));
        assert_eq!(set.get(REQUEST_ID_KEY).and_then(Value::as_str), Some("r1"));
        assert_eq!(set.get("filepath").and_then(Value::as_str), Some("/tmp/x"));
    }
}
