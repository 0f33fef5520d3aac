//! JSON export helpers

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::errors::Result;

/// Pretty-printed JSON
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write `value` as pretty JSON, creating parent directories as needed
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json_string(value)?)?;
    tracing::debug!(path = %path.display(), "wrote JSON export");
    Ok(())
}

/// Write raw text (DOT, ...), creating parent directories as needed
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ifds::IfdsRecord;

    #[test]
    fn test_write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("facts.json");
        let records = vec![IfdsRecord {
            point_id: 3,
            point: "main#3: ret".to_string(),
            facts: vec!["Tainted(x)".to_string()],
        }];

        write_json(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<IfdsRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, records);
    }
}
