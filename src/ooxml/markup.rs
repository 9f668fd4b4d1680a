//! Small XML helpers shared by the package, body and drawing readers/writers.
//!
//! Markup is handled with regular expressions over a known subset of
//! WordprocessingML, not with a general XML parser.

use once_cell::sync::Lazy;
use regex::Regex;

static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid attribute pattern")
});
static ENTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#x[0-9A-Fa-f]+);").expect("valid entity pattern")
});

/// Escape special XML characters in text content
pub fn escape_xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape special XML characters in attribute values
///
/// Tabs and line breaks are written as character references so attribute
/// value normalization keeps them.
pub fn escape_xml_attr(attr: &str) -> String {
    escape_xml_text(attr)
        .replace('\"', "&quot;")
        .replace('\'', "&apos;")
        .replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}

/// Resolve the five predefined entities and numeric character references.
///
/// References that do not name a valid character are kept as written.
pub fn unescape_xml(text: &str) -> String {
    ENTITY_PATTERN
        .replace_all(text, |cap: &regex::Captures| {
            let entity = &cap[1];
            let resolved = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            match resolved {
                Some(c) => c.to_string(),
                None => cap[0].to_string(),
            }
        })
        .into_owned()
}

/// Attributes of a start tag, in document order, with entities resolved.
pub fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE_PATTERN
        .captures_iter(tag)
        .filter_map(|cap| {
            let value = cap.get(2).or_else(|| cap.get(3))?;
            Some((cap[1].to_string(), unescape_xml(value.as_str())))
        })
        .collect()
}

/// Value of a single attribute of a start tag.
pub fn attribute(tag: &str, name: &str) -> Option<String> {
    parse_attributes(tag)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Byte span of the first `<name ...>` start tag in `xml`.
fn start_tag_span(xml: &str, name: &str) -> Option<(usize, usize)> {
    let open = format!("<{}", name);
    let mut from = 0;
    while let Some(pos) = xml[from..].find(&open) {
        let start = from + pos;
        let after = start + open.len();
        // Reject longer names sharing the prefix, e.g. `<a:ext` vs `<a:extLst`
        match xml[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {
                let end = xml[after..].find('>')?;
                return Some((start, after + end + 1));
            }
            _ => from = after,
        }
    }
    None
}

/// Start tag of the first `<name ...>` element in `xml`.
pub fn find_start_tag<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    start_tag_span(xml, name).map(|(start, end)| &xml[start..end])
}

/// Inner markup of the first `<name ...>...</name>` element in `xml`.
///
/// Returns an empty string for a self-closing element. Nested elements of
/// the same name are not supported.
pub fn find_element<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let (start, end) = start_tag_span(xml, name)?;
    if xml[start..end].ends_with("/>") {
        return Some("");
    }
    let close = format!("</{}>", name);
    let len = xml[end..].find(&close)?;
    Some(&xml[end..end + len])
}
