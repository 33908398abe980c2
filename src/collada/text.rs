//! Typed value extraction from COLLADA elements.
//!
//! COLLADA stores almost everything as whitespace separated text. The
//! scanners here are deliberately lenient: anything that does not look like
//! a number is skipped rather than turned into an error.

use std::str::FromStr;

use glam::{Vec3, Vec4};
use roxmltree::Node;

/// Lower-cased local tag name of an element.
pub fn tag_name(node: &Node<'_, '_>) -> String {
    node.tag_name().name().to_ascii_lowercase()
}

/// Element children of `node`, skipping text, comments and PIs.
pub fn elements<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(|child| child.is_element())
}

/// First element child with the given lower-cased tag name.
pub fn child_element<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    elements(node).find(|child| tag_name(child) == name)
}

/// Attribute value, or `None` when it is missing.
pub fn attribute(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

/// Attribute value with an ASCII case-insensitive name match.
pub fn attribute_ignore_case<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name().eq_ignore_ascii_case(name))
        .map(|attr| attr.value())
}

/// Attribute value that is present and not empty.
pub fn non_empty_attribute(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Strips a single leading `#` URI fragment marker.
pub fn strip_marker(value: &str) -> &str {
    value.strip_prefix('#').unwrap_or(value)
}

/// Concatenated text content of an element's direct text children.
pub fn text(node: &Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

/// Finds every numeric token in `text` and converts it to `T`.
///
/// Tokens that fail to convert (e.g. a fractional value scanned for `u32`)
/// are dropped.
pub fn scan_numbers<T: FromStr>(text: &str) -> Vec<T> {
    NumberTokens::new(text)
        .filter_map(|token| token.parse::<T>().ok())
        .collect()
}

/// Index value standing in for a numeric token that is not a valid `u32`.
///
/// It lies outside every source, so the tuple holding it fails the range
/// check when it is read.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Scans an index list, keeping one slot per numeric token.
///
/// Tokens such as `-1`, `2.5` or `4294967296` become [`INVALID_INDEX`]
/// instead of being dropped, which would shift every later index into the
/// wrong tuple position.
pub fn scan_indices(text: &str) -> Vec<u32> {
    NumberTokens::new(text)
        .map(|token| token.parse::<u32>().unwrap_or(INVALID_INDEX))
        .collect()
}

/// Scans exactly the first three numbers of `text`.
pub fn parse_vec3(text: &str) -> Option<Vec3> {
    let mut numbers = NumberTokens::new(text).filter_map(|t| t.parse::<f32>().ok());
    Some(Vec3::new(numbers.next()?, numbers.next()?, numbers.next()?))
}

/// Scans exactly the first four numbers of `text`.
pub fn parse_vec4(text: &str) -> Option<Vec4> {
    let mut numbers = NumberTokens::new(text).filter_map(|t| t.parse::<f32>().ok());
    Some(Vec4::new(
        numbers.next()?,
        numbers.next()?,
        numbers.next()?,
        numbers.next()?,
    ))
}

/// Parses a leading integer the way C `atoi` does: optional whitespace and
/// sign followed by digits, anything after is ignored, `0` on failure.
pub fn leading_int(text: &str) -> i32 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    trimmed[..end].parse::<i64>().map_or(0, |value| {
        value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    })
}

/// Iterator over numeric-looking slices of a string.
///
/// A token is an optional sign, digits with an optional fractional part (at
/// least one digit overall) and an optional exponent.
struct NumberTokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> NumberTokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn match_at(bytes: &[u8], start: usize) -> Option<usize> {
        let mut i = start;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let mut digits = 0;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
            digits += 1;
        }
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
                j += 1;
            }
            let exponent_start = j;
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            if j > exponent_start {
                i = j;
            }
        }
        Some(i)
    }
}

impl<'a> Iterator for NumberTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let start = self.pos;
            match Self::match_at(bytes, start) {
                Some(end) => {
                    self.pos = end;
                    return Some(&self.text[start..end]);
                }
                None => self.pos += 1,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_signed_and_fractional_numbers() {
        let values: Vec<f32> = scan_numbers("  -1.5 +2 .25 3.\n4e2  1.0E-1 ");
        assert_eq!(values, vec![-1.5, 2.0, 0.25, 3.0, 400.0, 0.1]);
    }

    #[test]
    fn skips_non_numeric_tokens() {
        let values: Vec<f32> = scan_numbers("1 abc 2 nan - . 3");
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unsigned_scan_drops_fractional_tokens() {
        let values: Vec<u32> = scan_numbers("0 1 2.5 3");
        assert_eq!(values, vec![0, 1, 3]);
    }

    #[test]
    fn index_scan_keeps_a_slot_per_numeric_token() {
        let indices = scan_indices("0 -1 1 x 2.5 4294967296 3");
        assert_eq!(
            indices,
            vec![0, INVALID_INDEX, 1, INVALID_INDEX, INVALID_INDEX, 3]
        );
    }

    #[test]
    fn scanning_formatted_output_is_idempotent() {
        let first: Vec<f32> = scan_numbers("0.5 -12.125 3 7e1 -0.001");
        let joined = first
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let second: Vec<f32> = scan_numbers(&joined);
        assert_eq!(first, second);
    }

    #[test]
    fn vectors_need_enough_components() {
        assert_eq!(parse_vec3("1 2 3 4"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(parse_vec3("1 2"), None);
        assert_eq!(parse_vec4("0 1 0 45"), Some(Vec4::new(0.0, 1.0, 0.0, 45.0)));
    }

    #[test]
    fn leading_int_behaves_like_atoi() {
        assert_eq!(leading_int(" 42abc"), 42);
        assert_eq!(leading_int("-7"), -7);
        assert_eq!(leading_int("x1"), 0);
        assert_eq!(leading_int(""), 0);
    }

    #[test]
    fn strip_marker_removes_one_hash() {
        assert_eq!(strip_marker("#G1"), "G1");
        assert_eq!(strip_marker("G1"), "G1");
        assert_eq!(strip_marker("##G1"), "#G1");
    }

    #[test]
    fn tag_names_are_lower_cased() {
        let doc = roxmltree::Document::parse("<COLLADA><Library_Geometries/></COLLADA>").unwrap();
        let root = doc.root_element();
        assert_eq!(tag_name(&root), "collada");
        assert!(child_element(&root, "library_geometries").is_some());
    }
}
