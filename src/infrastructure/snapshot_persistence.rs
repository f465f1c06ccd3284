use crate::domain::oracle::OracleSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stores one JSON snapshot file per source in a directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create snapshot directory")?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a source id; path separators and other odd characters become `_`.
    fn path_for(&self, source_id: &str) -> PathBuf {
        let name: String = source_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    pub fn save(&self, snapshot: &OracleSnapshot) -> Result<()> {
        let path = self.path_for(&snapshot.source_id);
        let content = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp snapshot file")?;
        fs::rename(&temp_path, &path).context("Failed to rename snapshot file")?;

        info!(
            "Saved snapshot for {} ({} observations) to {:?}",
            snapshot.source_id,
            snapshot.observations.len(),
            path
        );
        Ok(())
    }

    pub fn load(&self, source_id: &str) -> Result<Option<OracleSnapshot>> {
        let path = self.path_for(source_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    /// Every snapshot in the directory, ordered by file name.
    pub fn load_all(&self) -> Result<Vec<OracleSnapshot>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .context("Failed to list snapshot directory")?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths.iter().map(|path| Self::read(path)).collect()
    }

    fn read(path: &Path) -> Result<OracleSnapshot> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot JSON {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::observation::{DerivedObservation, OracleState};

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vol-oracle-{}-{}", name, std::process::id()))
    }

    fn snapshot(source_id: &str) -> OracleSnapshot {
        let newest = DerivedObservation {
            timestamp: 1_001,
            tick_cumulative: 7,
            tick_square_cumulative: 49,
        };
        OracleSnapshot {
            source_id: source_id.to_string(),
            buffer_capacity: 16,
            state: OracleState {
                initialized: true,
                last_checked_source_index: 3,
                last_timestamp: 1_001,
                last_tick_cumulative: 7,
                last_tick_square_cumulative: 49,
                write_counter: 1,
            },
            observations: vec![
                DerivedObservation {
                    timestamp: 1_000,
                    tick_cumulative: 0,
                    tick_square_cumulative: 0,
                },
                newest,
            ],
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = temp_dir("save-load");
        let store = SnapshotStore::new(&dir).unwrap();

        store.save(&snapshot("ETH/USDC")).unwrap();
        store.save(&snapshot("DAI/USDC")).unwrap();

        assert_eq!(store.load("ETH/USDC").unwrap(), Some(snapshot("ETH/USDC")));
        assert_eq!(store.load("WBTC/ETH").unwrap(), None);

        let all = store.load_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["DAI/USDC", "ETH/USDC"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = temp_dir("corrupt");
        let store = SnapshotStore::new(&dir).unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();

        assert!(store.load("broken").is_err());
        assert!(store.load_all().is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
