/// On-disk copies of fetched channel history.
///
/// A snapshot lets a report be re-rendered offline (`--from-raw`) without
/// hitting the API again.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::history::RawHistory;

/// Resolve the data root (`SNITCH_DATA_DIR`, default `.snitch`).
pub fn resolve_data_root() -> PathBuf {
    std::env::var_os("SNITCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".snitch"))
}

/// Default snapshot path for a channel: `{data_root}/raw/{channel_id}.json`.
pub fn default_snapshot_path(data_root: &Path, channel_id: &str) -> PathBuf {
    data_root.join("raw").join(format!("{}.json", channel_id))
}

pub fn save(history: &RawHistory, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(history).context("Failed to serialize history")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    tracing::info!(
        "Saved {} raw records to {}",
        history.messages.len(),
        path.display()
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<RawHistory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let history: RawHistory = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_snapshot_path(dir.path(), "C123");
        let history = RawHistory::new(
            vec![json!({"type": "message", "user": "U1", "ts": "1.5"})],
            true,
        );

        save(&history, &path).unwrap();
        assert!(path.exists());
        assert_eq!(load(&path).unwrap(), history);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read snapshot"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_err());
    }
}
