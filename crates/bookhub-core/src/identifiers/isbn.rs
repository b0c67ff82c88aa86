use serde::{Deserialize, Serialize};

use crate::error::{BookhubError, Result};
use crate::models::ISBN_NOT_AVAILABLE;

/// Checksum-validated ISBN in both of its spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Isbn {
    pub raw: String,
    pub isbn13: String,
    pub isbn10: Option<String>,
}

/// Dedup key for a provider-native ISBN: every character outside `[0-9Xx]`
/// removed, check character upper-cased. `""` means "no usable ISBN".
pub fn isbn_key(raw: &str) -> String {
    if raw.trim().eq_ignore_ascii_case(ISBN_NOT_AVAILABLE) {
        return String::new();
    }
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Like [`isbn_key`], but folds checksum-valid ISBN-10s onto their ISBN-13
/// so both spellings of one book produce the same key.
pub fn canonical_isbn_key(raw: &str) -> String {
    let key = isbn_key(raw);
    match Isbn::parse(&key) {
        Ok(isbn) => isbn.isbn13,
        Err(_) => key,
    }
}

fn digit_values(stripped: &str) -> Option<Vec<u32>> {
    stripped
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            'X' if i == 9 && stripped.len() == 10 => Some(10),
            c => c.to_digit(10),
        })
        .collect()
}

fn check_isbn10(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| (10 - i as u32) * d)
        .sum();
    sum % 11 == 0
}

fn isbn13_weighted_sum(digits: &[u32]) -> u32 {
    digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum()
}

fn check_isbn13(digits: &[u32]) -> bool {
    isbn13_weighted_sum(digits) % 10 == 0
}

fn isbn10_to_isbn13(digits10: &[u32]) -> String {
    let mut d13: Vec<u32> = vec![9, 7, 8];
    d13.extend_from_slice(&digits10[..9]);
    let check = (10 - isbn13_weighted_sum(&d13) % 10) % 10;
    d13.push(check);
    d13.iter().map(|d| d.to_string()).collect()
}

fn isbn13_to_isbn10(digits13: &[u32]) -> String {
    let body = &digits13[3..12];
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, d)| (10 - i as u32) * d)
        .sum();
    let check = (11 - sum % 11) % 11;
    let mut s: String = body.iter().map(|d| d.to_string()).collect();
    s.push(if check == 10 {
        'X'
    } else {
        char::from_digit(check, 10).unwrap_or('0')
    });
    s
}

impl Isbn {
    pub fn parse(input: &str) -> Result<Self> {
        let stripped = isbn_key(input);
        let invalid = || BookhubError::InvalidIsbn(input.to_string());
        let digits = digit_values(&stripped).ok_or_else(invalid)?;

        match digits.len() {
            13 => {
                if !check_isbn13(&digits) {
                    return Err(invalid());
                }
                // Only the 978 prefix has an ISBN-10 equivalent.
                let isbn10 = stripped
                    .starts_with("978")
                    .then(|| isbn13_to_isbn10(&digits));
                Ok(Self {
                    raw: input.to_string(),
                    isbn13: stripped,
                    isbn10,
                })
            }
            10 => {
                if !check_isbn10(&digits) {
                    return Err(invalid());
                }
                Ok(Self {
                    raw: input.to_string(),
                    isbn13: isbn10_to_isbn13(&digits),
                    isbn10: Some(stripped),
                })
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_formatting() {
        assert_eq!(isbn_key("978-0-306-40615-7"), "9780306406157");
        assert_eq!(isbn_key(" 0 306 40615 2 "), "0306406152");
        assert_eq!(isbn_key("007462542x"), "007462542X");
    }

    #[test]
    fn key_treats_not_available_as_empty() {
        assert_eq!(isbn_key("N/A"), "");
        assert_eq!(isbn_key("n/a"), "");
        assert_eq!(isbn_key(""), "");
    }

    #[test]
    fn valid_isbn13() {
        let isbn = Isbn::parse("978-0-306-40615-7").unwrap();
        assert_eq!(isbn.isbn13, "9780306406157");
        assert_eq!(isbn.isbn10.as_deref(), Some("0306406152"));
    }

    #[test]
    fn valid_isbn10_with_x_check() {
        let isbn = Isbn::parse("007462542X").unwrap();
        assert_eq!(isbn.isbn10.as_deref(), Some("007462542X"));
        assert_eq!(isbn.isbn13.len(), 13);
    }

    #[test]
    fn invalid_check_digit() {
        assert!(Isbn::parse("9780306406158").is_err());
        assert!(Isbn::parse("12345").is_err());
    }

    #[test]
    fn isbn13_979_has_no_isbn10() {
        let isbn = Isbn::parse("9791032305690").unwrap();
        assert_eq!(isbn.isbn10, None);
    }

    #[test]
    fn canonical_key_folds_isbn10_onto_isbn13() {
        assert_eq!(canonical_isbn_key("0-306-40615-2"), "9780306406157");
        assert_eq!(canonical_isbn_key("9780306406157"), "9780306406157");
        // Unparseable keys fall back to the stripped form.
        assert_eq!(canonical_isbn_key("12-34"), "1234");
    }
}
