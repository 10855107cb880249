//! Metadata document serialization
//!
//! Documents use the Java-properties XML layout understood by bulk import
//! tools:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
//! <properties>
//! 	<entry key="type">cm:content</entry>
//! 	<entry key="aspects">cm:titled,cm:auditable</entry>
//! 	<entry key="cm:title">Report</entry>
//! </properties>
//! ```

use std::collections::BTreeMap;

pub const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n<properties>";
pub const FOOTER: &str = "\n</properties>";

/// Escapes `&`, `<` and `>`
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether `c` may appear in an XML 1.0 document
pub fn is_valid_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Removes characters that are not legal in XML 1.0
///
/// Returns the cleaned text and whether anything was removed.
pub fn strip_invalid_xml_chars(text: &str) -> (String, bool) {
    if text.chars().all(is_valid_xml_char) {
        return (text.to_string(), false);
    }
    (text.chars().filter(|c| is_valid_xml_char(*c)).collect(), true)
}

/// Renders the document body and envelope
///
/// The body is stripped of illegal characters; the returned flag reports
/// whether that changed anything.
pub fn render(
    node_type: &str,
    aspects: &[String],
    properties: &BTreeMap<String, String>,
) -> (String, bool) {
    let mut body = String::new();
    push_entry(&mut body, "type", node_type);
    push_entry(&mut body, "aspects", &aspects.join(","));
    for (key, value) in properties {
        push_entry(&mut body, key, value);
    }

    let (body, stripped) = strip_invalid_xml_chars(&body);
    (format!("{HEADER}{body}{FOOTER}"), stripped)
}

fn push_entry(out: &mut String, key: &str, value: &str) {
    out.push_str("\n\t<entry key=\"");
    out.push_str(key);
    out.push_str("\">");
    out.push_str(&escape_value(value));
    out.push_str("</entry>");
}
