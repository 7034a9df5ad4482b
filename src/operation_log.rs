use crate::user_settings::app_data_dir;
use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log file name
const OPERATION_LOG_FILE: &str = "operation_log.txt";

/// Get the full path to the operation log file
fn log_path() -> PathBuf {
    app_data_dir().join(OPERATION_LOG_FILE)
}

/// Get the full path to the operation log file as a string for display
pub fn log_file_path() -> String {
    log_path().display().to_string()
}

/// Append a structured log entry describing a user-requested operation.
pub fn append_log(operation: &str, chain_id: u64, details: impl AsRef<str>) -> Result<()> {
    append_log_to(&log_path(), operation, chain_id, details.as_ref())
}

fn append_log_to(path: &Path, operation: &str, chain_id: u64, details: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let timestamp = Utc::now().to_rfc3339();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(file, "[{}] chain_id={} operation={}", timestamp, chain_id, operation)?;

    if details.trim().is_empty() {
        writeln!(file, "  (no additional details)")?;
    } else {
        for line in details.lines() {
            if line.trim().is_empty() {
                writeln!(file)?;
            } else {
                writeln!(file, "  {}", line)?;
            }
        }
    }

    writeln!(file)?;
    Ok(())
}

/// Read the entire log file content
pub fn read_log() -> Result<String> {
    read_log_from(&log_path())
}

fn read_log_from(path: &Path) -> Result<String> {
    if path.exists() {
        Ok(fs::read_to_string(path)?)
    } else {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tsender_oplog_{}_{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_append_log_writes_header_and_indented_details() {
        let path = temp_log_path("details");
        let _ = fs::remove_file(&path);

        append_log_to(&path, "airdrop", 31337, "token: 0xaa\nrecipients: 2").unwrap();
        let content = read_log_from(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(content.contains("chain_id=31337 operation=airdrop"));
        assert!(content.contains("\n  token: 0xaa\n"));
        assert!(content.contains("\n  recipients: 2\n"));
    }

    #[test]
    fn test_append_log_empty_details() {
        let path = temp_log_path("empty");
        let _ = fs::remove_file(&path);

        append_log_to(&path, "airdrop_failed", 1, "  ").unwrap();
        let content = read_log_from(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(content.contains("(no additional details)"));
    }

    #[test]
    fn test_append_log_appends_entries() {
        let path = temp_log_path("append");
        let _ = fs::remove_file(&path);

        append_log_to(&path, "first", 1, "a").unwrap();
        append_log_to(&path, "second", 1, "b").unwrap();
        let content = read_log_from(&path).unwrap();
        let _ = fs::remove_file(&path);

        let first = content.find("operation=first").unwrap();
        let second = content.find("operation=second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        assert_eq!(read_log_from(&temp_log_path("missing")).unwrap(), "");
    }
}
