use anyhow::{anyhow, Result};
use ethers::types::U256;

/// Format an amount in smallest units as whole tokens, e.g. `1500000` with
/// 6 decimals becomes `1.5`. Trailing zeros are dropped.
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
    match ethers::utils::format_units(amount, decimals as u32) {
        Ok(formatted) => trim_fraction(&formatted),
        Err(_) => amount.to_string(),
    }
}

fn trim_fraction(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Recipients and amounts read from an `address,amount` CSV file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImport {
    /// One address per line, ready for the recipients field
    pub recipients: String,
    /// One amount per line, ready for the amounts field
    pub amounts: String,
    pub rows: usize,
    /// Rows dropped because the address was malformed or the amount missing
    pub skipped: usize,
}

fn looks_like_address(value: &str) -> bool {
    value.starts_with("0x") && value.len() == 42
}

/// Parse CSV content with `address,amount` rows. A leading header row is
/// ignored. Malformed rows are skipped and counted, not fatal; the amounts
/// themselves are checked later by the form.
pub fn parse_airdrop_csv(contents: &str) -> Result<CsvImport> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut recipients = Vec::new();
    let mut amounts = Vec::new();
    let mut skipped = 0;

    for (line_num, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| anyhow!("CSV parsing error at line {}: {}", line_num + 1, e))?;
        let address = record.get(0).unwrap_or("").trim_matches('"').trim();
        let amount = record.get(1).unwrap_or("").trim_matches('"').trim();

        if address.is_empty() {
            continue;
        }
        if line_num == 0 && !address.starts_with("0x") {
            // header
            continue;
        }
        if !looks_like_address(address) || amount.is_empty() {
            skipped += 1;
            continue;
        }
        recipients.push(address.to_string());
        amounts.push(amount.to_string());
    }

    if skipped > 0 {
        tracing::warn!("{} invalid rows were skipped during CSV import", skipped);
    }

    Ok(CsvImport {
        rows: recipients.len(),
        recipients: recipients.join("\n"),
        amounts: amounts.join("\n"),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== format_token_amount tests ====================

    #[test]
    fn test_format_token_amount_zero() {
        assert_eq!(format_token_amount(U256::zero(), 18), "0");
    }

    #[test]
    fn test_format_token_amount_whole_tokens() {
        let amount = U256::from(3u64) * U256::from(10u64.pow(18));
        assert_eq!(format_token_amount(amount, 18), "3");
    }

    #[test]
    fn test_format_token_amount_fractional() {
        assert_eq!(format_token_amount(U256::from(1_500_000u64), 6), "1.5");
    }

    #[test]
    fn test_format_token_amount_zero_decimals() {
        assert_eq!(format_token_amount(U256::from(600u64), 0), "600");
    }

    #[test]
    fn test_format_token_amount_small_fraction() {
        assert_eq!(format_token_amount(U256::from(1u64), 18), "0.000000000000000001");
    }

    // ==================== parse_airdrop_csv tests ====================

    #[test]
    fn test_parse_airdrop_csv_with_header() {
        let csv = "address,amount\n\
                   0x742d35Cc6634C0532925a3b844Bc454e4438f44e,100\n\
                   0x0000000000000000000000000000000000000001, 200\n";
        let import = parse_airdrop_csv(csv).unwrap();
        assert_eq!(import.rows, 2);
        assert_eq!(import.skipped, 0);
        assert_eq!(
            import.recipients,
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e\n0x0000000000000000000000000000000000000001"
        );
        assert_eq!(import.amounts, "100\n200");
    }

    #[test]
    fn test_parse_airdrop_csv_without_header() {
        let csv = "0x0000000000000000000000000000000000000001,5";
        let import = parse_airdrop_csv(csv).unwrap();
        assert_eq!(import.rows, 1);
        assert_eq!(import.amounts, "5");
    }

    #[test]
    fn test_parse_airdrop_csv_skips_bad_rows() {
        let csv = "0x0000000000000000000000000000000000000001,5\n\
                   0x1234,7\n\
                   0x0000000000000000000000000000000000000002\n\
                   0x0000000000000000000000000000000000000003,9\n";
        let import = parse_airdrop_csv(csv).unwrap();
        assert_eq!(import.rows, 2);
        assert_eq!(import.skipped, 2);
        assert_eq!(import.amounts, "5\n9");
    }

    #[test]
    fn test_parse_airdrop_csv_empty() {
        let import = parse_airdrop_csv("").unwrap();
        assert_eq!(import, CsvImport::default());
    }
}
