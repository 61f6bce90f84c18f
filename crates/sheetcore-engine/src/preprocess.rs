//! Rewrites formula source text into something `rhai` can compile:
//! integer literals get a forced `.0` (rhai does not mix `i64` and `f64`
//! arithmetic implicitly), and `A1` references / `SUM(A1:B5)` ranges get
//! rewritten into `cell(row, col)` / `sum_range(r1, c1, r2, c2)` calls.
//!
//! Both passes skip double-quoted string literals, mirroring
//! `replace_cell_refs_outside_strings` from the teacher.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::position::Position;

/// Calls `f` on each double-quoted string literal is skipped; used for
/// extraction passes that don't need to rebuild the source text.
pub(crate) fn scan_outside_strings<'a>(s: &'a str, mut f: impl FnMut(&'a str)) {
    let bytes = s.as_bytes();
    let mut seg_start = 0usize;
    let mut in_string = false;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
                seg_start = i + 1;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            f(&s[seg_start..i]);
            in_string = true;
            i += 1;
            continue;
        }
        i += 1;
    }
    if !in_string && seg_start < s.len() {
        f(&s[seg_start..]);
    }
}

/// Rebuilds `s`, passing each non-string-literal segment through `f` and
/// leaving quoted segments untouched.
pub(crate) fn replace_outside_strings(s: &str, mut f: impl FnMut(&str) -> String) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut seg_start = 0usize;
    let mut in_string = false;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == b'"' {
                out.push_str(&s[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            out.push_str(&f(&s[seg_start..i]));
            in_string = true;
            seg_start = i;
            i += 1;
            continue;
        }
        i += 1;
    }
    if seg_start < s.len() {
        if in_string {
            out.push_str(&s[seg_start..]);
        } else {
            out.push_str(&f(&s[seg_start..]));
        }
    }
    out
}

fn int_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[0-9]+(\.[0-9]+)?\b").unwrap())
}

/// Forces every bare integer literal to a float literal, leaving existing
/// float literals (already carrying a `.`) untouched. Safe to run before
/// reference rewriting: `\b` never matches between a letter and a digit,
/// so the digits inside `A1` are never touched by this pass.
pub(crate) fn coerce_float_literals(expr: &str) -> String {
    replace_outside_strings(expr, |seg| {
        int_literal_re()
            .replace_all(seg, |caps: &Captures| {
                if caps.get(1).is_some() {
                    caps[0].to_string()
                } else {
                    format!("{}.0", &caps[0])
                }
            })
            .into_owned()
    })
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(SUM|AVERAGE|MIN|MAX|COUNT)\(([A-Za-z]+[0-9]+):([A-Za-z]+[0-9]+)\)").unwrap()
    })
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z]+)([0-9]+)\b").unwrap())
}

fn range_rhai_name(func: &str) -> &'static str {
    match func {
        "SUM" => "sum_range",
        "AVERAGE" => "avg_range",
        "MIN" => "min_range",
        "MAX" => "max_range",
        "COUNT" => "count_range",
        _ => unreachable!("range_re only matches the five names above"),
    }
}

/// Scans `expr` for every cell reference — bare (`A1`) and range endpoints
/// (`A1:B5`) — validating each and expanding ranges into their full set of
/// positions. Returns the first malformed token as `Err` (a `spec.md`
/// §9 "invalid reference" `FormulaSyntaxError`).
pub(crate) fn extract_references(expr: &str) -> Result<Vec<Position>, String> {
    let mut refs = Vec::new();
    let mut bad: Option<String> = None;
    scan_outside_strings(expr, |seg| {
        if bad.is_some() {
            return;
        }
        for caps in range_re().captures_iter(seg) {
            let start = Position::parse(&caps[2].to_uppercase());
            let end = Position::parse(&caps[3].to_uppercase());
            match (start, end) {
                (Some(start), Some(end)) => {
                    for row in start.row.min(end.row)..=start.row.max(end.row) {
                        for col in start.col.min(end.col)..=start.col.max(end.col) {
                            refs.push(Position::new(row, col));
                        }
                    }
                }
                _ => {
                    bad = Some(caps[0].to_string());
                    return;
                }
            }
        }
        let without_ranges = range_re().replace_all(seg, "");
        for caps in cell_re().captures_iter(&without_ranges) {
            let token = format!("{}{}", &caps[1], &caps[2]);
            match Position::parse(&token.to_uppercase()) {
                Some(pos) => refs.push(pos),
                None => {
                    bad = Some(token);
                    return;
                }
            }
        }
    });
    match bad {
        Some(bad) => Err(bad),
        None => {
            refs.sort();
            refs.dedup();
            Ok(refs)
        }
    }
}

/// Rewrites cell references and range calls into the native-function call
/// form `rhai` will actually compile and run. Assumes every reference was
/// already validated by [`extract_references`].
pub(crate) fn rewrite_references(expr: &str) -> String {
    replace_outside_strings(expr, |seg| {
        let with_ranges = range_re()
            .replace_all(seg, |caps: &Captures| {
                let name = range_rhai_name(&caps[1]);
                let start = Position::parse(&caps[2].to_uppercase()).expect("validated earlier");
                let end = Position::parse(&caps[3].to_uppercase()).expect("validated earlier");
                format!(
                    "{}({}, {}, {}, {})",
                    name, start.row, start.col, end.row, end.col
                )
            })
            .into_owned();
        cell_re()
            .replace_all(&with_ranges, |caps: &Captures| {
                let token = format!("{}{}", &caps[1], &caps[2]);
                match Position::parse(&token.to_uppercase()) {
                    Some(pos) => format!("cell({}, {})", pos.row, pos.col),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_bare_integers_only() {
        assert_eq!(coerce_float_literals("1+2"), "1.0+2.0");
        assert_eq!(coerce_float_literals("1.5+2"), "1.5+2.0");
        assert_eq!(coerce_float_literals("A1+1"), "A1+1.0");
    }

    #[test]
    fn skips_string_literals() {
        assert_eq!(coerce_float_literals(r#""A1 plus 1""#), r#""A1 plus 1""#);
    }

    #[test]
    fn extracts_bare_and_range_references() {
        let refs = extract_references("A1+SUM(B1:B3)").unwrap();
        assert!(refs.contains(&Position::new(0, 0)));
        assert!(refs.contains(&Position::new(0, 1)));
        assert!(refs.contains(&Position::new(1, 1)));
        assert!(refs.contains(&Position::new(2, 1)));
    }

    #[test]
    fn rejects_malformed_reference() {
        assert!(extract_references("ZZZZ1+1").is_err());
    }

    #[test]
    fn rewrites_refs_and_ranges() {
        assert_eq!(rewrite_references("A1+B2"), "cell(0, 0)+cell(1, 1)");
        assert_eq!(rewrite_references("SUM(A1:A3)"), "sum_range(0, 0, 2, 0)");
    }
}
