//! Cell addressing in A1 notation.
//!
//! A `CellAddress` is a zero-based (row, col) pair. User-facing input and
//! output use A1 notation: one or more letters followed by one or more
//! digits (`A1`, `AA10`). Input is case-insensitive and normalized to
//! uppercase before validation.

use serde::{Deserialize, Serialize};

/// Zero-based cell coordinates within a sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse strict A1 notation. Rejects anything that is not
    /// letters-then-digits (no `$`, no range separators, no whitespace
    /// inside the token). Leading/trailing whitespace is trimmed and
    /// letters are uppercased first.
    pub fn parse_a1(input: &str) -> Option<Self> {
        let token = input.trim().to_uppercase();
        if token.is_empty() {
            return None;
        }
        let split = token.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = token.split_at(split);
        if letters.is_empty() || digits.is_empty() {
            return None;
        }
        if !letters.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let row_1 = digits.parse::<usize>().ok()?;
        if row_1 == 0 {
            return None;
        }
        Some(Self {
            row: row_1 - 1,
            col: letters_to_col(letters)?,
        })
    }

    /// Format as A1 notation (`row=0, col=0` -> `A1`).
    pub fn to_a1(&self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }
}

impl std::fmt::Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// A rectangular region anchored at a top-left cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub origin: CellAddress,
    pub rows: usize,
    pub cols: usize,
}

impl Region {
    pub fn new(origin: CellAddress, rows: usize, cols: usize) -> Self {
        Self { origin, rows, cols }
    }

    /// Single-cell region.
    pub fn cell(origin: CellAddress) -> Self {
        Self { origin, rows: 1, cols: 1 }
    }
}

/// Convert 0-based column index to Excel-style letter(s): 0=A, 25=Z, 26=AA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert Excel-style letters back to a 0-based column index.
/// Expects uppercase ASCII letters only. Letter runs whose index does not
/// fit in `usize` are rejected, not wrapped.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c as usize - 'A' as usize + 1)?;
    }
    Some(col - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(CellAddress::parse_a1("A1"), Some(CellAddress::new(0, 0)));
        assert_eq!(CellAddress::parse_a1("B3"), Some(CellAddress::new(2, 1)));
        assert_eq!(CellAddress::parse_a1("AA10"), Some(CellAddress::new(9, 26)));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(CellAddress::parse_a1("c7"), Some(CellAddress::new(6, 2)));
        assert_eq!(CellAddress::parse_a1("  aB12 "), Some(CellAddress::new(11, 27)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "A", "12", "A0", "1A", "A1B", "A 1", "$A$1", "A1:B2", "Ä1"] {
            assert_eq!(CellAddress::parse_a1(bad), None, "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_a1_round_trip() {
        for (row, col) in [(0, 0), (9, 25), (99, 26), (0, 701), (41, 702)] {
            let addr = CellAddress::new(row, col);
            assert_eq!(CellAddress::parse_a1(&addr.to_a1()), Some(addr));
        }
    }

    #[test]
    fn test_col_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(letters_to_col("ZZ"), Some(701));
        assert_eq!(letters_to_col("AAA"), Some(702));
    }

    #[test]
    fn test_overlong_letter_run_rejected() {
        // 16 letters overflows the column index; must reject, not panic.
        let letters = "Z".repeat(16);
        assert_eq!(letters_to_col(&letters), None);
        assert_eq!(CellAddress::parse_a1(&format!("{}1", letters)), None);
        assert_eq!(CellAddress::parse_a1(&format!("{}1", "A".repeat(64))), None);
    }
}
