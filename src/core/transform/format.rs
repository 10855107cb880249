//! Property value formatting

use crate::domain::PropertyValue;

/// Rendering of date values, always in UTC
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a raw property value as document text
///
/// Dates use [`DATE_FORMAT`], lists become a JSON array of their display
/// names and `Null` becomes the empty string.
pub fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Null => String::new(),
        PropertyValue::Text(s) => s.clone(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(f) => f.to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::Date(dt) => dt.format(DATE_FORMAT).to_string(),
        PropertyValue::List(items) => {
            serde_json::to_string(items).unwrap_or_else(|_| String::from("[]"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use test_case::test_case;

    #[test_case(PropertyValue::Null, "")]
    #[test_case(PropertyValue::Text("hello".to_string()), "hello")]
    #[test_case(PropertyValue::Integer(-42), "-42")]
    #[test_case(PropertyValue::Float(1.5), "1.5")]
    #[test_case(PropertyValue::Boolean(true), "true")]
    fn test_scalars(value: PropertyValue, expected: &str) {
        assert_eq!(format_value(&value), expected);
    }

    #[test]
    fn test_date_is_rendered_in_utc() {
        let local = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 17, 10, 30, 5)
            .unwrap();
        let value = PropertyValue::Date(local.with_timezone(&Utc));
        assert_eq!(format_value(&value), "2024-05-17 08:30:05");
    }

    #[test]
    fn test_list_is_json_array() {
        let value = PropertyValue::List(vec!["finance".to_string(), "q\"1".to_string()]);
        assert_eq!(format_value(&value), r#"["finance","q\"1"]"#);
        assert_eq!(format_value(&PropertyValue::List(Vec::new())), "[]");
    }

    #[test]
    fn test_date_from_utc_constructor() {
        let value = PropertyValue::Date(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(format_value(&value), "2020-01-02 03:04:05");
    }
}
