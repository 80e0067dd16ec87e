//! C1: the `.conf` parser.
//!
//! A hand-rolled, line-oriented scanner implementing the grammar from
//! spec.md §4.1. Grounded in `dot_conf_parser`'s line-by-line `parse_str`
//! (the closest example to a flat `.conf`-style reader in the pack) for the
//! overall shape — one line at a time, blank lines and `#`-comments skipped
//! — generalized here to the richer grammar (escaped dots, quoted strings,
//! bracketed pair-lists, comma-separated values) spec.md §4.1 requires.

use crate::error::Error;
use crate::value::{KeyPath, RawValue, Segment};

/// Parses a complete `.conf` document into an ordered sequence of
/// `(key, raw value)` pairs, one per non-blank, non-comment line.
///
/// Line numbers in any resulting [`Error::Parse`] are 1-based.
pub(crate) fn parse(input: &str) -> Result<Vec<(KeyPath, RawValue)>, Error> {
    let mut out = Vec::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let eq_pos = find_top_level_eq(line).ok_or_else(|| Error::parse(line_no, "missing `=` in setting line"))?;
        let key_part = line[..eq_pos].trim();
        let value_part = &line[eq_pos + 1..];
        if key_part.is_empty() {
            return Err(Error::parse(line_no, "empty key"));
        }
        let key = parse_key(key_part, line_no)?;
        let value_part = strip_comment(value_part);
        let value = parse_values(value_part.trim(), line_no)?;
        out.push((key, value));
    }
    Ok(out)
}

fn find_top_level_eq(line: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut chars = line.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                chars.next();
            }
            '=' if !in_quotes => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Strips a trailing `#`-comment, ignoring `#` that appears inside a quoted
/// string or a bracketed list.
fn strip_comment(value_part: &str) -> &str {
    let mut in_quotes = false;
    let mut depth = 0i32;
    let mut chars = value_part.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                chars.next();
            }
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth -= 1,
            '#' if !in_quotes && depth <= 0 => return &value_part[..idx],
            _ => {}
        }
    }
    value_part
}

fn ensure_latin1(s: &str, line_no: usize) -> Result<(), Error> {
    if let Some(c) = s.chars().find(|c| (*c as u32) > 0xFF) {
        return Err(Error::parse(line_no, format!("character `{c}` is outside the Latin-1 range")));
    }
    Ok(())
}

/// Splits a dotted key into segments, honoring `\.` escapes and `"..."`
/// quoted segments (which may themselves contain literal dots).
fn parse_key(input: &str, line_no: usize) -> Result<KeyPath, Error> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();
    let mut saw_any = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes || chars.peek() == Some(&'.') => {
                if let Some(escaped) = chars.next() {
                    buf.push(escaped);
                }
            }
            '.' if !in_quotes => {
                if buf.is_empty() {
                    return Err(Error::parse(line_no, "empty key segment"));
                }
                ensure_latin1(&buf, line_no)?;
                segments.push(Segment::literal(std::mem::take(&mut buf)));
                saw_any = true;
            }
            other => buf.push(other),
        }
    }
    if in_quotes {
        return Err(Error::parse(line_no, "unterminated quoted key segment"));
    }
    if buf.is_empty() {
        if !saw_any {
            return Err(Error::parse(line_no, "empty key"));
        }
        return Err(Error::parse(line_no, "trailing `.` in key"));
    }
    ensure_latin1(&buf, line_no)?;
    segments.push(Segment::literal(buf));
    Ok(KeyPath::new(segments))
}

/// Splits `s` on top-level commas (not inside quotes or brackets), trimming
/// whitespace from each item and dropping a trailing empty item produced by
/// a dangling comma.
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut depth = 0i32;
    let mut chars = s.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                chars.next();
            }
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth -= 1,
            ',' if !in_quotes && depth <= 0 => {
                items.push(s[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() || items.is_empty() {
        items.push(last);
    }
    items
}

fn parse_scalar(item: &str, line_no: usize) -> Result<String, Error> {
    let trimmed = item.trim();
    if let Some(inner) = trimmed.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| Error::parse(line_no, "unterminated quoted string"))?;
        let unescaped = unescape(inner);
        ensure_latin1(&unescaped, line_no)?;
        Ok(unescaped)
    } else {
        Ok(trimmed.to_owned())
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_list_value(s: &str, line_no: usize) -> Result<Vec<(String, String)>, Error> {
    let inner = s
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| Error::parse(line_no, "malformed bracketed list"))?;
    let mut pairs = Vec::new();
    for item in split_top_level_commas(inner) {
        if item.is_empty() {
            continue;
        }
        let eq_pos = find_top_level_eq(item).ok_or_else(|| Error::parse(line_no, "missing `=` in list entry"))?;
        let key = item[..eq_pos].trim().to_owned();
        let value = parse_scalar(&item[eq_pos + 1..], line_no)?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn parse_values(input: &str, line_no: usize) -> Result<RawValue, Error> {
    if input.starts_with('[') {
        return parse_list_value(input, line_no).map(RawValue::PairList);
    }
    let items = split_top_level_commas(input);
    let mut scalars = Vec::with_capacity(items.len());
    for item in items {
        scalars.push(parse_scalar(item, line_no)?);
    }
    match scalars.len() {
        0 => Ok(RawValue::Scalar(String::new())),
        1 => Ok(RawValue::Scalar(scalars.into_iter().next().unwrap())),
        _ => Ok(RawValue::List(scalars)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_binary_setting() {
        let pairs = parse("log.level = info\n").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.to_dotted(), "log.level");
        assert_eq!(pairs[0].1, RawValue::Scalar("info".to_owned()));
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let pairs = parse("\n# a comment\n   \nlog.level = info\n").unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn strips_trailing_comment_outside_quotes() {
        let pairs = parse("a = 1 # trailing\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("1".to_owned()));
    }

    #[test]
    fn keeps_hash_inside_quotes() {
        let pairs = parse(r#"a = "value # not a comment""#).unwrap();
        assert_eq!(pairs[0].1, RawValue::Scalar("value # not a comment".to_owned()));
    }

    #[test]
    fn escaped_dot_stays_in_one_segment() {
        let pairs = parse(r"riak\.node.name = x").unwrap();
        assert_eq!(pairs[0].0.segments().len(), 2);
        assert_eq!(pairs[0].0.to_dotted(), r"riak\.node.name");
    }

    #[test]
    fn comma_separated_values_become_a_list() {
        let pairs = parse("a.b = 1, 2, 3\n").unwrap();
        assert_eq!(pairs[0].1, RawValue::List(vec!["1".into(), "2".into(), "3".into()]));
    }

    #[test]
    fn bracketed_pairs_parse_as_pair_list() {
        let pairs = parse("a.b = [x=1, y=2]\n").unwrap();
        assert_eq!(
            pairs[0].1,
            RawValue::PairList(vec![("x".into(), "1".into()), ("y".into(), "2".into())])
        );
    }

    #[test]
    fn missing_equals_is_a_parse_error() {
        let err = parse("not.a.setting\n").unwrap_err();
        assert_eq!(err, Error::parse(1, "missing `=` in setting line"));
    }

    #[test]
    fn line_numbers_are_one_based_and_account_for_earlier_errors() {
        let err = parse("a = 1\nbroken\n").unwrap_err();
        assert_eq!(err, Error::parse(2, "missing `=` in setting line"));
    }
}
