//! Completion journal
//!
//! Append-only log of node ids whose export fully succeeded, one file per
//! cache key (`<dir>/<key>.complete`). Each append is a single framed record
//! written at the end of the file and synced; earlier bytes are never
//! rewritten.

use super::record::{decode_records, encode_record, JOURNAL_MAGIC};
use crate::domain::{BulkExportError, CacheKey, NodeId, Result};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable record of completed nodes for one cache key
#[derive(Debug)]
pub struct CompletionJournal {
    path: PathBuf,
    key: CacheKey,
    file: Option<File>,
}

impl CompletionJournal {
    /// Location of the journal file for `key`
    pub fn path_for(dir: &Path, key: &CacheKey) -> PathBuf {
        dir.join(format!("{}.complete", key.file_stem()))
    }

    /// Opens the journal for `key` under `dir`
    ///
    /// A torn trailing record left by an abrupt stop is truncated away so
    /// that later appends extend the last complete record. Nothing else in
    /// the file is touched.
    pub fn open(dir: &Path, key: &CacheKey) -> Result<Self> {
        let path = Self::path_for(dir, key);

        match fs::read(&path) {
            Ok(bytes) => {
                let decoded = decode_records(&bytes, JOURNAL_MAGIC)?;
                if !decoded.clean {
                    tracing::warn!(
                        cache_key = %key,
                        kept = decoded.ids.len(),
                        discarded_bytes = bytes.len() - decoded.valid_len,
                        "Truncating torn record at end of completion journal"
                    );
                    let file = OpenOptions::new().write(true).open(&path)?;
                    file.set_len(decoded.valid_len as u64)?;
                    file.sync_data()?;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BulkExportError::State(format!(
                    "Failed to read completion journal {}: {e}",
                    path.display()
                )))
            }
        }

        Ok(Self {
            path,
            key: key.clone(),
            file: None,
        })
    }

    /// Handle for reading the journal without repairing it
    pub fn inspect(dir: &Path, key: &CacheKey) -> Self {
        Self {
            path: Self::path_for(dir, key),
            key: key.clone(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every completed id in append order
    ///
    /// Stops at the first short or malformed record.
    pub fn load(&self) -> Result<Vec<NodeId>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let decoded = decode_records(&bytes, JOURNAL_MAGIC)?;
        if !decoded.clean {
            tracing::warn!(
                cache_key = %self.key,
                entries = decoded.ids.len(),
                "Completion journal ends in a malformed record; treating it as end of journal"
            );
        }
        Ok(decoded.ids)
    }

    /// Candidates not yet journaled, in candidate order
    ///
    /// Repeated candidates are kept once, at their first position.
    pub fn resume_set(&self, candidates: &[NodeId]) -> Result<Vec<NodeId>> {
        let completed: HashSet<NodeId> = self.load()?.into_iter().collect();
        Ok(subtract(candidates, &completed))
    }

    /// Durably records one completed node
    pub fn append(&mut self, id: &NodeId) -> Result<()> {
        let record = encode_record(id)?;
        let path = self.path.clone();
        let file = self.writer()?;
        file.write_all(&record)
            .and_then(|_| file.sync_data())
            .map_err(|e| {
                BulkExportError::State(format!(
                    "Failed to append to completion journal {}: {e}",
                    path.display()
                ))
            })
    }

    fn writer(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            let len = file.metadata()?.len();
            if len < JOURNAL_MAGIC.len() as u64 {
                // Missing, empty or torn magic: start fresh.
                file.set_len(0)?;
                file.write_all(&JOURNAL_MAGIC)?;
                file.sync_data()?;
            }
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| BulkExportError::State("Completion journal not open".to_string()))
    }
}

/// `candidates` minus `completed`, order-preserving and without repeats
pub fn subtract(candidates: &[NodeId], completed: &HashSet<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|id| !completed.contains(*id) && seen.insert((*id).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::new(*n).unwrap()).collect()
    }

    fn key() -> CacheKey {
        CacheKey::new("root").unwrap()
    }

    #[test]
    fn test_missing_journal_loads_empty() {
        let dir = TempDir::new().unwrap();
        let journal = CompletionJournal::open(dir.path(), &key()).unwrap();
        assert!(journal.load().unwrap().is_empty());
        assert!(!journal.path().exists());
    }

    #[test]
    fn test_append_across_reopen_keeps_prior_entries() {
        let dir = TempDir::new().unwrap();
        {
            let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
            journal.append(&ids(&["a"])[0]).unwrap();
            journal.append(&ids(&["b"])[0]).unwrap();
        }
        {
            let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
            journal.append(&ids(&["c"])[0]).unwrap();
        }
        let journal = CompletionJournal::open(dir.path(), &key()).unwrap();
        assert_eq!(journal.load().unwrap(), ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_torn_tail_is_truncated_on_open() {
        let dir = TempDir::new().unwrap();
        {
            let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
            journal.append(&ids(&["a"])[0]).unwrap();
        }
        let path = CompletionJournal::path_for(dir.path(), &key());
        let good_len = fs::metadata(&path).unwrap().len();
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[7, 0, 0, 0, b'p', b'a']).unwrap();
        drop(f);

        let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);
        journal.append(&ids(&["b"])[0]).unwrap();
        assert_eq!(journal.load().unwrap(), ids(&["a", "b"]));
    }

    #[test]
    fn test_load_stops_at_malformed_record() {
        let dir = TempDir::new().unwrap();
        let path = CompletionJournal::path_for(dir.path(), &key());
        let mut bytes = JOURNAL_MAGIC.to_vec();
        bytes.extend(encode_record(&ids(&["a"])[0]).unwrap());
        bytes.extend_from_slice(&[3, 0]);
        fs::write(&path, &bytes).unwrap();

        let journal = CompletionJournal::inspect(dir.path(), &key());
        assert_eq!(journal.load().unwrap(), ids(&["a"]));
        assert_eq!(fs::metadata(&path).unwrap().len(), bytes.len() as u64);
    }

    #[test]
    fn test_resume_set_preserves_order() {
        let dir = TempDir::new().unwrap();
        let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
        journal.append(&ids(&["b"])[0]).unwrap();
        journal.append(&ids(&["d"])[0]).unwrap();

        let candidates = ids(&["a", "b", "c", "d", "e"]);
        let resume = journal.resume_set(&candidates).unwrap();
        assert_eq!(resume, ids(&["a", "c", "e"]));
    }

    #[test]
    fn test_resume_and_journal_partition_candidates() {
        let dir = TempDir::new().unwrap();
        let mut journal = CompletionJournal::open(dir.path(), &key()).unwrap();
        let candidates = ids(&["n1", "n2", "n3", "n4", "n5", "n6"]);
        for id in candidates.iter().step_by(2) {
            journal.append(id).unwrap();
        }

        let resume = journal.resume_set(&candidates).unwrap();
        let journalled = journal.load().unwrap();
        for id in &candidates {
            assert!(resume.contains(id) ^ journalled.contains(id));
        }
        assert_eq!(resume.len() + journalled.len(), candidates.len());
    }

    #[test]
    fn test_subtract_drops_repeats() {
        let candidates = ids(&["a", "b", "a", "c"]);
        let completed: HashSet<NodeId> = ids(&["c"]).into_iter().collect();
        assert_eq!(subtract(&candidates, &completed), ids(&["a", "b"]));
    }
}
