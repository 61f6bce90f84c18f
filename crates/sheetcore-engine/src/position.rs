//! Cell position: `(row, col)` pair with `A1`-style text form.
//!
//! Column letters are bijective base-26 (`A`..`Z`, `AA`..`ZZ`, `AAA`..`ZZZ`);
//! row numbers are 1-based in text, 0-based internally.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// One past the largest addressable row index.
pub const MAX_ROWS: u32 = 16384;
/// One past the largest addressable column index.
pub const MAX_COLS: u32 = 16384;

const MAX_POSITION_LENGTH: usize = 17;
const MAX_COLUMN_LETTERS: usize = 3;

/// A 0-indexed cell position. Fields are public so callers can construct
/// an out-of-range `Position` directly; [`Position::is_valid`] is the real
/// bound check every public operation relies on.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub fn new(row: u32, col: u32) -> Position {
        Position { row, col }
    }

    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse spreadsheet notation (`"A1"`, `"AB12"`). Returns `None` — the
    /// "distinguished sentinel" from `spec.md` §4.1 — on any malformed
    /// input: empty strings, digits before letters, more than 3 column
    /// letters, length over 17, or an out-of-range result.
    pub fn parse(text: &str) -> Option<Position> {
        if text.is_empty() || text.len() > MAX_POSITION_LENGTH {
            return None;
        }
        let caps = position_re().captures(text)?;
        let letters = &caps[1];
        let digits = &caps[2];
        if letters.len() > MAX_COLUMN_LETTERS {
            return None;
        }
        let col = letters
            .bytes()
            .fold(0u64, |acc, b| acc * 26 + (b - b'A') as u64 + 1)
            .checked_sub(1)?;
        let row = digits.parse::<u64>().ok()?.checked_sub(1)?;
        let pos = Position {
            row: row.try_into().ok()?,
            col: col.try_into().ok()?,
        };
        pos.is_valid().then_some(pos)
    }

    /// Render in spreadsheet notation.
    pub fn to_text(self) -> String {
        let mut col = self.col + 1;
        let mut letters = Vec::new();
        while col > 0 {
            col -= 1;
            letters.push(b'A' + (col % 26) as u8);
            col /= 26;
        }
        letters.reverse();
        let mut out = String::from_utf8(letters).expect("column letters are ascii");
        out.push_str(&(self.row + 1).to_string());
        out
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::str::FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::parse(s).ok_or(())
    }
}

fn position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]+)([0-9]+)$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_text() {
        for (row, col) in [(0, 0), (0, 25), (0, 26), (9, 701), (16383, 16383)] {
            let pos = Position::new(row, col);
            assert_eq!(Position::parse(&pos.to_text()), Some(pos));
        }
    }

    #[test]
    fn bijective_base_26_columns() {
        assert_eq!(Position::new(0, 0).to_text(), "A1");
        assert_eq!(Position::new(0, 25).to_text(), "Z1");
        assert_eq!(Position::new(0, 26).to_text(), "AA1");
        assert_eq!(Position::new(0, 51).to_text(), "AZ1");
        assert_eq!(Position::new(0, 52).to_text(), "BA1");
        assert_eq!(Position::new(0, 701).to_text(), "ZZ1");
        assert_eq!(Position::new(0, 702).to_text(), "AAA1");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Position::parse(""), None);
        assert_eq!(Position::parse("1A"), None);
        assert_eq!(Position::parse("A"), None);
        assert_eq!(Position::parse("1"), None);
        assert_eq!(Position::parse("AAAA1"), None); // > 3 letters
        assert_eq!(Position::parse("A00000000000000"), None); // > 17 chars
        assert_eq!(Position::parse("A0"), None); // row 0 is out of range (1-based)
        assert_eq!(Position::parse("a1"), None); // lowercase rejected by the grammar itself
    }

    #[test]
    fn rejects_out_of_range_results() {
        assert_eq!(Position::parse("ZZZ1"), None); // column 18277 >= MAX_COLS
        assert_eq!(Position::parse("A16385"), None); // row 16384 >= MAX_ROWS
        assert!(Position::parse("A16384").is_some());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(1, 0) < Position::new(1, 1));
    }
}
