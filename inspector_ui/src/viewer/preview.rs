//! One-line previews of record payloads for list rows

use super::classify::format_number;
use super::render::member_keys;
use super::value::Value;

/// Characters of a string payload shown in a list row
pub const PREVIEW_LEN: usize = 50;

/// Preview of the first payload item
pub fn preview(payload: &[Value], max_len: usize) -> String {
    let Some(first) = payload.first() else {
        return String::new();
    };

    match first {
        Value::String(s) => s.chars().take(max_len).collect(),
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n).chars().take(max_len).collect(),
        Value::Array(array) => format!("Sequence({})", array.len()),
        Value::Object(object) => match member_keys(object).first() {
            Some(key) => match object.get(key) {
                Ok(value) => format!("{{ {}: {} ... }}", key, value.kind_name()),
                Err(_) => format!("{{ {}: ? ... }}", key),
            },
            None => "Object".to_string(),
        },
        Value::Function(function) => {
            super::signature::Signature::extract(function).display()
        }
        Value::Inaccessible(_) => "Preview unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_preview_is_cut() {
        let payload = vec![Value::from("y".repeat(80))];
        assert_eq!(preview(&payload, PREVIEW_LEN).len(), PREVIEW_LEN);
    }

    #[test]
    fn test_container_previews() {
        let list = vec![Value::array([Value::Null, Value::Null])];
        assert_eq!(preview(&list, PREVIEW_LEN), "Sequence(2)");

        let object = vec![Value::object([("tag", Value::from("iq"))])];
        assert_eq!(preview(&object, PREVIEW_LEN), "{ tag: string ... }");

        assert_eq!(preview(&[], PREVIEW_LEN), "");
    }
}
