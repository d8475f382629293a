// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Source
//!
//! Loads the ordered recipient/amount list a run distributes. Two file
//! formats are understood, chosen by extension:
//!
//! - `.json`: an array of `{"address": "...", "amount": "..."}` objects
//!   (`amount` may also be a JSON number);
//! - anything else: CSV whose header names an `address` and an `amount`
//!   column (any order, extra columns ignored).
//!
//! Loading is all-or-nothing: one malformed row rejects the whole list, since
//! the list order decides batch membership.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::blockchain::parse_amount;
use crate::error::{DistributionError, DistributionResult};
use crate::models::TransferRecord;

/// Supplies the full, ordered transfer list for a run.
pub trait TransferSource {
    fn load_transfers(&self) -> DistributionResult<Vec<TransferRecord>>;
}

/// Transfer list stored in a local CSV or JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    /// Decimals used to scale amounts to base units
    decimals: u8,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, decimals: u8) -> Self {
        Self {
            path: path.into(),
            decimals,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

impl TransferSource for FileSource {
    fn load_transfers(&self) -> DistributionResult<Vec<TransferRecord>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            DistributionError::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;

        let transfers = if self.is_json() {
            parse_json(&content, self.decimals)?
        } else {
            parse_csv(&content, self.decimals)?
        };

        tracing::info!(
            path = %self.path.display(),
            records = transfers.len(),
            "Transfer list loaded"
        );
        Ok(transfers)
    }
}

/// Build a record from raw fields, validating both.
pub fn transfer_record(
    address: &str,
    amount: &str,
    decimals: u8,
) -> Result<TransferRecord, String> {
    let address = address.trim();
    let amount = amount.trim();
    if address.is_empty() {
        return Err("missing address".to_string());
    }
    if amount.is_empty() {
        return Err("missing amount".to_string());
    }

    let recipient =
        Address::from_str(address).map_err(|e| format!("invalid address {address:?}: {e}"))?;
    let base_units = parse_amount(amount, decimals).map_err(|e| e.to_string())?;

    Ok(TransferRecord {
        recipient,
        amount: amount.to_string(),
        base_units,
    })
}

fn parse_csv(content: &str, decimals: u8) -> DistributionResult<Vec<TransferRecord>> {
    let malformed = |line: usize, reason: String| {
        DistributionError::SourceUnavailable(format!("line {line}: {reason}"))
    };

    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_start_matches('\u{feff}')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Ok(Vec::new());
    };

    let columns = split_csv_line(header).map_err(|e| malformed(header_line, e))?;
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| malformed(header_line, format!("header has no `{name}` column")))
    };
    let address_col = column("address")?;
    let amount_col = column("amount")?;

    lines
        .map(|(line_no, line)| {
            let fields = split_csv_line(line).map_err(|e| malformed(line_no, e))?;
            let field = |idx: usize| fields.get(idx).map(String::as_str).unwrap_or("");
            transfer_record(field(address_col), field(amount_col), decimals)
                .map_err(|e| malformed(line_no, e))
        })
        .collect()
}

/// Split one CSV line, honouring double-quoted fields.
fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

#[derive(Deserialize)]
struct RawTransfer {
    address: Option<String>,
    amount: Option<serde_json::Value>,
}

fn parse_json(content: &str, decimals: u8) -> DistributionResult<Vec<TransferRecord>> {
    let raw: Vec<RawTransfer> = serde_json::from_str(content)
        .map_err(|e| DistributionError::SourceUnavailable(format!("invalid JSON list: {e}")))?;

    raw.into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let amount = match entry.amount {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                Some(other) => {
                    return Err(DistributionError::SourceUnavailable(format!(
                        "record {idx}: amount must be a string or number, got {other}"
                    )))
                }
                None => String::new(),
            };
            transfer_record(entry.address.as_deref().unwrap_or(""), &amount, decimals)
                .map_err(|e| DistributionError::SourceUnavailable(format!("record {idx}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_csv_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "wallets_to_transfer.csv",
            &format!("address,amount\n{A},0.042\n\n{B},1\n{A},0.001\n"),
        );

        let transfers = FileSource::new(path, 18).load_transfers().unwrap();
        assert_eq!(transfers.len(), 3);
        assert_eq!(transfers[0].amount, "0.042");
        assert_eq!(transfers[1].base_units, U256::from(1_000_000_000_000_000_000u64));
        // duplicates are kept as independent transfers
        assert_eq!(transfers[0].recipient, transfers[2].recipient);
    }

    #[test]
    fn csv_columns_found_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "list.csv",
            &format!("\"Amount\",note,ADDRESS\n5,\"first, quoted\",{A}\n"),
        );

        let transfers = FileSource::new(path, 0).load_transfers().unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].base_units, U256::from(5u64));
    }

    #[test]
    fn csv_missing_field_rejects_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.csv", &format!("address,amount\n{A},1\n{B},\n"));

        let err = FileSource::new(path, 18).load_transfers().unwrap_err();
        match err {
            DistributionError::SourceUnavailable(msg) => {
                assert!(msg.contains("line 3"), "{msg}");
                assert!(msg.contains("missing amount"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_without_amount_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.csv", &format!("address,value\n{A},1\n"));
        assert!(matches!(
            FileSource::new(path, 18).load_transfers(),
            Err(DistributionError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn bad_address_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.csv", "address,amount\n0x1234,1\n");
        assert!(matches!(
            FileSource::new(path, 18).load_transfers(),
            Err(DistributionError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileSource::new(dir.path().join("absent.csv"), 18).load_transfers();
        assert!(matches!(result, Err(DistributionError::SourceUnavailable(_))));
    }

    #[test]
    fn empty_csv_is_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.csv", "");
        assert!(FileSource::new(path, 18).load_transfers().unwrap().is_empty());
    }

    #[test]
    fn loads_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "list.json",
            &format!(r#"[{{"address":"{A}","amount":"0.5"}},{{"address":"{B}","amount":2}}]"#),
        );

        let transfers = FileSource::new(path, 6).load_transfers().unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].base_units, U256::from(500_000u64));
        assert_eq!(transfers[1].amount, "2");
        assert_eq!(transfers[1].base_units, U256::from(2_000_000u64));
    }

    #[test]
    fn json_missing_address_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.json", r#"[{"amount":"1"}]"#);
        let err = FileSource::new(path, 18).load_transfers().unwrap_err();
        assert!(err.to_string().contains("record 0: missing address"));
    }

    #[test]
    fn split_handles_escaped_quotes() {
        assert_eq!(
            split_csv_line(r#"a,"b ""c"", d",e"#).unwrap(),
            vec!["a", "b \"c\", d", "e"]
        );
        assert!(split_csv_line("\"open").is_err());
    }
}
