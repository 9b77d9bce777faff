//! RFC 5424 `STRUCTURED-DATA` parsing (`spec.md` §4.2).
//!
//! A hand-rolled state machine over `{outside, in-element, in-id, in-param,
//! in-name, in-value}` walking the input byte-by-byte with a cursor, never
//! backtracking. Escape handling covers `\"`, `\\`, `\]`. Unlike the
//! original buffer-mutating implementation this crate is grounded on, each
//! PARAM-VALUE is emitted as a fresh owned `String` rather than splicing
//! escape bytes out of a shared buffer in place (`SPEC_FULL.md` §9,
//! buffer-ownership decision) — callers get a `LogParts` that owns all of
//! its strings independently of the original wire buffer's lifetime.

use crate::error::StructuredDataError;
use std::collections::BTreeMap;

/// An SD-ID's PARAM-NAME/PARAM-VALUE pairs, insertion ordered (RFC 5424
/// does not mandate an order, but preserving wire order keeps output
/// reproducible, unlike a `HashMap`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        ParamMap { entries: Vec::new() }
    }

    pub fn insert(&mut self, name: String, value: String) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// SD-ID -> its parameters. Keyed in a `BTreeMap` for deterministic,
/// sorted output regardless of wire order.
pub type StructuredData = BTreeMap<String, ParamMap>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InElement,
    InId,
    InParam,
    InName,
    InValue,
}

/// `-` NILVALUE, a trailing space, or an empty buffer all mean "no
/// structured data" and are not errors.
pub fn parse_structured_data(
    buf: &[u8],
    cursor: &mut usize,
) -> Result<StructuredData, StructuredDataError> {
    let l = buf.len();
    if *cursor >= l {
        return Ok(StructuredData::new());
    }
    if buf[*cursor] == b'-' {
        *cursor += 1;
        if *cursor < l && buf[*cursor] != b' ' {
            return Err(StructuredDataError::NoStructuredData);
        }
        return Ok(StructuredData::new());
    }
    if buf[*cursor] == b' ' {
        return Ok(StructuredData::new());
    }
    if buf[*cursor] != b'[' {
        return Err(StructuredDataError::NoStructuredData);
    }

    let mut out = StructuredData::new();
    let mut state = State::Outside;
    let mut in_escape = false;
    let mut from = *cursor;
    let mut to = *cursor;
    let mut curr_id = String::new();
    let mut curr_name = String::new();
    let mut curr_value = String::new();

    while to < l {
        let c = buf[to];
        match c {
            b'\\' => {
                if state != State::InValue {
                    return Err(StructuredDataError::CharOutsideElement('\\'));
                }
                if !in_escape {
                    if to + 1 < l && matches!(buf[to + 1], b'"' | b'\\' | b']') {
                        curr_value.push_str(&String::from_utf8_lossy(&buf[from..to]));
                        from = to + 1;
                        in_escape = true;
                    }
                    // Not a recognized escape target: the backslash is left
                    // as a literal value byte.
                } else {
                    in_escape = false;
                }
                to += 1;
                continue;
            }
            b'[' => match state {
                State::InId | State::InName | State::InValue => {}
                State::InElement => return Err(StructuredDataError::NestedBracket),
                State::Outside | State::InParam => {
                    state = State::InId;
                    from = to + 1;
                }
            },
            b']' if !in_escape => match state {
                State::InId if to > from => {
                    curr_id = String::from_utf8_lossy(&buf[from..to]).into_owned();
                    out.entry(curr_id.clone()).or_insert_with(ParamMap::new);
                    state = State::Outside;
                }
                State::InValue if !curr_name.is_empty() => {
                    return Err(StructuredDataError::UnescapedBracketInValue)
                }
                State::InParam => {
                    if to == from {
                        return Err(StructuredDataError::MissingSdParam);
                    }
                    if !curr_name.is_empty() {
                        return Err(StructuredDataError::MissingParamValue);
                    }
                    curr_id.clear();
                    state = State::Outside;
                }
                State::InElement => {
                    if to == from {
                        return Err(StructuredDataError::EmptySdElement);
                    }
                    curr_id.clear();
                    state = State::Outside;
                }
                _ => return Err(StructuredDataError::CharOutsideElement(']')),
            },
            b'=' if !in_escape && state != State::InValue => match state {
                State::InName => {
                    curr_name = String::from_utf8_lossy(&buf[from..to]).into_owned();
                    state = State::InParam;
                    from = to + 1;
                }
                State::InId => return Err(StructuredDataError::SdIdInvalidChar('=')),
                State::Outside => return Err(StructuredDataError::CharOutsideElement('=')),
                _ => {}
            },
            b' ' if !in_escape && state != State::InValue => match state {
                State::InId => {
                    if to == from {
                        return Err(StructuredDataError::MissingSdId);
                    }
                    curr_id = String::from_utf8_lossy(&buf[from..to]).into_owned();
                    out.entry(curr_id.clone()).or_insert_with(ParamMap::new);
                    state = State::InName;
                    from = to + 1;
                }
                State::InName => return Err(StructuredDataError::ParamNameInvalidChar(' ')),
                State::InParam => {
                    if !curr_name.is_empty() {
                        return Err(StructuredDataError::MissingParamValue);
                    }
                    state = State::InName;
                    from = to + 1;
                }
                State::Outside => break,
                _ => {}
            },
            b'"' if !in_escape => match state {
                State::InName => return Err(StructuredDataError::ParamNameInvalidChar('"')),
                State::InId => return Err(StructuredDataError::SdIdInvalidChar('"')),
                State::InValue => {
                    curr_value.push_str(&String::from_utf8_lossy(&buf[from..to]));
                    let params = out.entry(curr_id.clone()).or_insert_with(ParamMap::new);
                    params.insert(curr_name.clone(), curr_value.clone());
                    curr_name.clear();
                    curr_value.clear();
                    state = State::InParam;
                }
                State::InParam => {
                    state = State::InValue;
                    from = to + 1;
                }
                State::Outside => return Err(StructuredDataError::CharOutsideElement('"')),
                _ => {}
            },
            _ => {
                if state == State::Outside {
                    return Err(StructuredDataError::CharOutsideElement(c as char));
                }
                if state == State::InId && to - from == 32 {
                    return Err(StructuredDataError::SdIdTooLong);
                }
                if state == State::InName && to - from == 32 {
                    return Err(StructuredDataError::ParamNameTooLong);
                }
            }
        }
        in_escape = false;
        to += 1;
    }

    if state != State::Outside {
        return Err(StructuredDataError::Unterminated);
    }
    *cursor = to;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<StructuredData, StructuredDataError> {
        let mut cursor = 0usize;
        parse_structured_data(s.as_bytes(), &mut cursor)
    }

    #[test]
    fn nilvalue_and_empty() {
        assert_eq!(parse("-").unwrap(), StructuredData::new());
        assert_eq!(parse("").unwrap(), StructuredData::new());
    }

    #[test]
    fn single_element_single_param() {
        let sd = parse(r#"[exampleSDID@32473 iut="3" eventSource="App"]"#).unwrap();
        let params = sd.get("exampleSDID@32473").unwrap();
        assert_eq!(params.get("iut"), Some("3"));
        assert_eq!(params.get("eventSource"), Some("App"));
    }

    #[test]
    fn multiple_elements() {
        let sd = parse(r#"[exampleSDID@32473 iut="3"][examplePriority@32473 class="high"]"#).unwrap();
        assert_eq!(sd.len(), 2);
        assert_eq!(sd.get("examplePriority@32473").unwrap().get("class"), Some("high"));
    }

    #[test]
    fn escaped_bracket_in_value() {
        let sd = parse(r#"[a@1 k="v\]al"]"#).unwrap();
        assert_eq!(sd.get("a@1").unwrap().get("k"), Some("v]al"));
    }

    #[test]
    fn unescaped_bracket_in_value_is_error() {
        let err = parse(r#"[a@1 k="v]al"]"#).unwrap_err();
        assert_eq!(err, StructuredDataError::UnescapedBracketInValue);
    }

    #[test]
    fn missing_start_bracket_is_error() {
        assert!(parse("not structured data").is_err());
    }

    #[test]
    fn unterminated_element_is_error() {
        let err = parse(r#"[a@1 k="v""#).unwrap_err();
        assert_eq!(err, StructuredDataError::Unterminated);
    }

    #[test]
    fn unterminated_name_is_error() {
        let err = parse(r#"[a@1 k"#).unwrap_err();
        assert_eq!(err, StructuredDataError::Unterminated);
    }

    #[test]
    fn unterminated_value_is_error() {
        let err = parse(r#"[a@1 k="v"#).unwrap_err();
        assert_eq!(err, StructuredDataError::Unterminated);
    }

    #[test]
    fn non_escape_backslash_is_kept_literal() {
        let sd = parse(r#"[a@1 path="C:\Windows"]"#).unwrap();
        assert_eq!(sd.get("a@1").unwrap().get("path"), Some(r"C:\Windows"));
    }

    #[test]
    fn escaped_backslash_collapses_to_one() {
        let sd = parse(r#"[a@1 k="a\\b"]"#).unwrap();
        assert_eq!(sd.get("a@1").unwrap().get("k"), Some(r"a\b"));
    }

    #[test]
    fn cursor_stops_after_structured_data() {
        let input = r#"[a@1 k="v"] trailing message"#;
        let mut cursor = 0usize;
        parse_structured_data(input.as_bytes(), &mut cursor).unwrap();
        assert_eq!(&input[cursor..], " trailing message");
    }
}
