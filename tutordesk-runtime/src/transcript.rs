use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One completed (or degraded) voice turn, kept so a shell can restore
/// recent context after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnTranscriptEntry {
    pub ts_unix_ms: i64,
    pub course_id: Option<String>,
    pub transcript: Option<String>,
    pub answer: Option<String>,
    pub stage: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranscriptStore {
    path: PathBuf,
    max_entries: usize,
}

impl TranscriptStore {
    pub fn at_path(path: PathBuf) -> Self {
        Self { path, max_entries: 200 }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn load(&self) -> anyhow::Result<Vec<TurnTranscriptEntry>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read transcript: {}", self.path.display()))?;
        let entries: Vec<TurnTranscriptEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse transcript: {}", self.path.display()))?;
        Ok(entries)
    }

    pub fn append(&self, entry: TurnTranscriptEntry) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            crate::files::ensure_dir(parent)?;
        }

        let mut entries = self.load()?;
        entries.push(entry);
        if entries.len() > self.max_entries {
            let start = entries.len() - self.max_entries;
            entries = entries.split_off(start);
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("failed to write transcript temp: {}", tmp.display()))?;
        crate::files::replace_file(&tmp, &self.path)
            .with_context(|| format!("failed to replace transcript: {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove transcript: {}", self.path.display()))?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: i64, transcript: &str) -> TurnTranscriptEntry {
        TurnTranscriptEntry {
            ts_unix_ms: ts,
            course_id: Some("nodejs".into()),
            transcript: Some(transcript.into()),
            answer: Some("answer".into()),
            stage: "done".into(),
            error: None,
        }
    }

    #[test]
    fn appends_and_limits_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::at_path(dir.path().join("transcript.json")).with_max_entries(2);

        store.append(entry(1, "a")).unwrap();
        store.append(entry(2, "b")).unwrap();
        store.append(entry(3, "c")).unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transcript.as_deref(), Some("b"));
        assert_eq!(entries[1].transcript.as_deref(), Some("c"));
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::at_path(dir.path().join("transcript.json"));

        store.append(entry(1, "a")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
