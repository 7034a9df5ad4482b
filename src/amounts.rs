//! Parsing of the free-text recipient and amount fields.
//!
//! Both fields accept entries separated by commas and/or newlines. Whitespace
//! around an entry is ignored and empty entries (e.g. `"1,,2"` or a trailing
//! newline) are dropped, so `"100,200\n300"` and `" 100 ,\n\n200,300\n"` parse
//! to the same list.

use ethers::types::{Address, U256};
use thiserror::Error;

/// Errors produced while parsing the amounts field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount #{position} '{segment}' is not a whole number of token units")]
    Invalid { position: usize, segment: String },
    #[error("Amount or sum of amounts overflows uint256")]
    Overflow,
}

/// Errors produced while parsing the recipients field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipientError {
    #[error("Recipient #{position} '{segment}' is not a valid address")]
    Invalid { position: usize, segment: String },
}

/// Split raw field text on runs of commas/newlines, trimming each entry and
/// skipping empty ones.
pub fn split_entries(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

/// Ordered list of amounts in the token's smallest unit, plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountList {
    amounts: Vec<U256>,
    total: U256,
}

impl AmountList {
    pub fn parse(text: &str) -> Result<Self, AmountError> {
        let mut amounts = Vec::new();
        let mut total = U256::zero();

        for (idx, segment) in split_entries(text).enumerate() {
            let amount = parse_amount(segment).map_err(|kind| match kind {
                AmountParse::NotDigits => AmountError::Invalid {
                    position: idx + 1,
                    segment: segment.to_string(),
                },
                AmountParse::TooLarge => AmountError::Overflow,
            })?;
            total = total.checked_add(amount).ok_or(AmountError::Overflow)?;
            amounts.push(amount);
        }

        Ok(Self { amounts, total })
    }

    pub fn total(&self) -> U256 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn as_slice(&self) -> &[U256] {
        &self.amounts
    }

    pub fn into_vec(self) -> Vec<U256> {
        self.amounts
    }
}

enum AmountParse {
    NotDigits,
    TooLarge,
}

/// Base-10 digits only; signs, decimals points and hex prefixes are rejected.
fn parse_amount(segment: &str) -> Result<U256, AmountParse> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountParse::NotDigits);
    }
    U256::from_dec_str(segment).map_err(|_| AmountParse::TooLarge)
}

/// Sum of the amounts field, used for the live total and the approval check
pub fn calculate_total(text: &str) -> Result<U256, AmountError> {
    AmountList::parse(text).map(|list| list.total())
}

/// Parse the recipients field into addresses, preserving order and duplicates.
pub fn parse_recipients(text: &str) -> Result<Vec<Address>, RecipientError> {
    split_entries(text)
        .enumerate()
        .map(|(idx, segment)| {
            segment.parse::<Address>().map_err(|_| RecipientError::Invalid {
                position: idx + 1,
                segment: segment.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(values: &[u64]) -> Vec<U256> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    // ==================== split_entries tests ====================

    #[test]
    fn test_split_entries_mixed_separators() {
        let entries: Vec<&str> = split_entries("a,b\nc").collect();
        assert_eq!(entries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_entries_skips_empty_and_whitespace() {
        let entries: Vec<&str> = split_entries(" a ,,\n\n  b\r\n, ,c,\n").collect();
        assert_eq!(entries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_entries_empty_input() {
        assert_eq!(split_entries("").count(), 0);
        assert_eq!(split_entries(" ,\n, ").count(), 0);
    }

    // ==================== AmountList::parse tests ====================

    #[test]
    fn test_parse_amounts_example() {
        let list = AmountList::parse("100,200\n300").unwrap();
        assert_eq!(list.as_slice(), amounts(&[100, 200, 300]).as_slice());
        assert_eq!(list.total(), U256::from(600));
    }

    #[test]
    fn test_parse_amounts_empty() {
        let list = AmountList::parse("").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.total(), U256::zero());
    }

    #[test]
    fn test_parse_amounts_separator_choice_does_not_matter() {
        let commas = AmountList::parse("5,10,15,20").unwrap();
        let newlines = AmountList::parse("5\n10\n15\n20").unwrap();
        let mixed = AmountList::parse("5\n10,15\n20").unwrap();
        assert_eq!(commas, newlines);
        assert_eq!(commas, mixed);
        assert_eq!(mixed.total(), U256::from(50));
    }

    #[test]
    fn test_parse_amounts_padding_does_not_change_length_or_sum() {
        let plain = AmountList::parse("1,2,3").unwrap();
        let padded = AmountList::parse("  1 ,, 2\n\n\n3 ,\n").unwrap();
        assert_eq!(padded.len(), 3);
        assert_eq!(padded.total(), plain.total());
    }

    #[test]
    fn test_parse_amounts_zero_is_allowed() {
        let list = AmountList::parse("0,0").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.total().is_zero());
    }

    #[test]
    fn test_parse_amounts_large_values() {
        let list = AmountList::parse("1000000000000000000000000,1").unwrap();
        let expected = U256::from_dec_str("1000000000000000000000001").unwrap();
        assert_eq!(list.total(), expected);
    }

    #[test]
    fn test_parse_amounts_non_numeric_rejected() {
        let err = AmountList::parse("100,abc,300").unwrap_err();
        assert_eq!(
            err,
            AmountError::Invalid { position: 2, segment: "abc".to_string() }
        );
    }

    #[test]
    fn test_parse_amounts_decimal_rejected() {
        assert!(matches!(
            AmountList::parse("1.5"),
            Err(AmountError::Invalid { position: 1, .. })
        ));
    }

    #[test]
    fn test_parse_amounts_negative_and_hex_rejected() {
        assert!(AmountList::parse("-1").is_err());
        assert!(AmountList::parse("+1").is_err());
        assert!(AmountList::parse("0x10").is_err());
    }

    #[test]
    fn test_parse_amounts_overflow() {
        let max = U256::MAX.to_string();
        let input = format!("{},1", max);
        assert_eq!(AmountList::parse(&input).unwrap_err(), AmountError::Overflow);
    }

    #[test]
    fn test_parse_amounts_single_segment_too_large_is_overflow() {
        let too_large = format!("5,1{}", "0".repeat(78));
        assert_eq!(AmountList::parse(&too_large).unwrap_err(), AmountError::Overflow);
        assert_eq!(calculate_total(&too_large).unwrap_err(), AmountError::Overflow);
    }

    // ==================== calculate_total tests ====================

    #[test]
    fn test_calculate_total_matches_parse() {
        assert_eq!(calculate_total("7\n8,9").unwrap(), U256::from(24));
        assert_eq!(calculate_total("").unwrap(), U256::zero());
    }

    // ==================== parse_recipients tests ====================

    #[test]
    fn test_parse_recipients_valid() {
        let input = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e,\n 0x0000000000000000000000000000000000000001 \n";
        let recipients = parse_recipients(input).unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(
            recipients[1],
            "0x0000000000000000000000000000000000000001".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_parse_recipients_keeps_duplicates_in_order() {
        let a = "0x0000000000000000000000000000000000000001";
        let b = "0x0000000000000000000000000000000000000002";
        let recipients = parse_recipients(&format!("{a},{b},{a}")).unwrap();
        assert_eq!(recipients.len(), 3);
        assert_eq!(recipients[0], recipients[2]);
    }

    #[test]
    fn test_parse_recipients_invalid() {
        let err = parse_recipients("0x0000000000000000000000000000000000000001,0x123").unwrap_err();
        assert_eq!(
            err,
            RecipientError::Invalid { position: 2, segment: "0x123".to_string() }
        );
    }

    #[test]
    fn test_parse_recipients_empty() {
        assert!(parse_recipients("\n,\n").unwrap().is_empty());
    }
}
