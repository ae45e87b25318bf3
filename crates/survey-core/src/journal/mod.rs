//! Append-only answer journal.
//!
//! One JSON-encoded `SurveyAnswer` per line, in commit order. The journal only
//! ever grows: `append` extends the file and syncs it before returning.
//!
//! ## Torn tails
//!
//! A final line without its terminating newline is the remains of an
//! interrupted append. Replay refuses to guess: it stops with
//! [`StoreError::CorruptRecord`] (`torn: true`). [`FileJournal::repair`]
//! truncates exactly that unterminated tail so replay yields the clean prefix.
//! A malformed line that *is* terminated is never removed automatically.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;

use crate::codec;
use crate::model::SurveyAnswer;
use crate::store::{StoreError, StoreResult};

/// Lazily decoded records, in append order.
pub type Records<'a> = Box<dyn Iterator<Item = StoreResult<SurveyAnswer>> + 'a>;

/// Append-only storage for answer records.
pub trait Journal: Send + Sync {
    /// Location of the backing resource.
    fn path(&self) -> &Path;

    /// Create the backing resource if it does not exist.
    fn ensure(&self) -> StoreResult<()>;

    /// Iterate over every stored record from the start.
    ///
    /// Each call starts a fresh pass. A missing or empty journal yields
    /// nothing.
    fn replay(&self) -> StoreResult<Records<'_>>;

    /// Durably append `records` in order.
    ///
    /// On success every record is on stable storage. On
    /// [`StoreError::AppendFailed`] any prefix of the batch may be.
    fn append(&self, records: &[SurveyAnswer]) -> StoreResult<()>;
}

/// File-based journal.
///
/// Uses advisory file locks (via `fs2`) around each append and replay pass.
#[derive(Debug, Clone)]
pub struct FileJournal {
    path: PathBuf,
}

/// Outcome of [`FileJournal::repair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Bytes removed from the end of the journal
    pub removed_bytes: u64,
    /// Journal length after repair
    pub len: u64,
}

impl FileJournal {
    /// Create a journal handle for the given path.
    ///
    /// Does not touch the filesystem; call `ensure` for that.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Truncate an unterminated final line left by an interrupted append.
    ///
    /// Complete lines are never touched. Returns zero removed bytes when the
    /// journal ends cleanly.
    pub fn repair(&self) -> StoreResult<RepairReport> {
        let file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(RepairReport {
                    removed_bytes: 0,
                    len: 0,
                });
            }
            Err(e) => return Err(StoreError::storage(&self.path, e)),
        };

        file.lock_exclusive()
            .map_err(|e| StoreError::storage(&self.path, e))?;

        let bytes = fs::read(&self.path).map_err(|e| StoreError::storage(&self.path, e))?;
        let len = bytes.len() as u64;
        let keep = clean_prefix_len(&bytes) as u64;

        if keep == len {
            return Ok(RepairReport {
                removed_bytes: 0,
                len,
            });
        }

        file.set_len(keep)
            .map_err(|e| StoreError::storage(&self.path, e))?;
        file.sync_all()
            .map_err(|e| StoreError::storage(&self.path, e))?;

        tracing::warn!(
            path = %self.path.display(),
            removed_bytes = len - keep,
            "truncated torn tail from answer journal"
        );

        Ok(RepairReport {
            removed_bytes: len - keep,
            len: keep,
        })
    }
}

/// Length of the journal up to and including its last newline, keeping an
/// unterminated tail only when it is blank.
fn clean_prefix_len(bytes: &[u8]) -> usize {
    let keep = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    if bytes[keep..].iter().all(u8::is_ascii_whitespace) {
        bytes.len()
    } else {
        keep
    }
}

impl Journal for FileJournal {
    fn path(&self) -> &Path {
        &self.path
    }

    fn ensure(&self) -> StoreResult<()> {
        if self.path.is_dir() {
            return Err(StoreError::storage(
                &self.path,
                io::Error::other("journal path is a directory"),
            ));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StoreError::storage(parent, e))?;
            }
        }

        // append mode never truncates an existing journal
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::storage(&self.path, e))?;

        Ok(())
    }

    fn replay(&self) -> StoreResult<Records<'_>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Box::new(std::iter::empty::<StoreResult<SurveyAnswer>>()));
            }
            Err(e) => return Err(StoreError::storage(&self.path, e)),
        };

        // Released when the reader (and its file) is dropped
        file.lock_shared()
            .map_err(|e| StoreError::storage(&self.path, e))?;

        Ok(Box::new(Replay {
            path: &self.path,
            reader: BufReader::new(file),
            buf: Vec::new(),
            line: 0,
            done: false,
        }))
    }

    fn append(&self, records: &[SurveyAnswer]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Encode everything before touching the file
        let mut lines = Vec::with_capacity(records.len());
        for record in records {
            let mut line =
                codec::encode(record).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
            line.push('\n');
            lines.push(line);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::storage(&self.path, e))?;

        file.lock_exclusive()
            .map_err(|e| StoreError::storage(&self.path, e))?;

        for line in &lines {
            file.write_all(line.as_bytes())
                .map_err(|e| StoreError::append(&self.path, e))?;
            file.sync_data()
                .map_err(|e| StoreError::append(&self.path, e))?;
        }

        tracing::debug!(
            path = %self.path.display(),
            records = lines.len(),
            "appended answers to journal"
        );

        Ok(())
    }
}

/// One sequential pass over a journal file.
struct Replay<'a> {
    path: &'a Path,
    reader: BufReader<File>,
    buf: Vec<u8>,
    line: usize,
    done: bool,
}

impl Replay<'_> {
    fn corrupt(&mut self, torn: bool, reason: impl Into<String>) -> StoreError {
        self.done = true;
        StoreError::CorruptRecord {
            path: self.path.to_path_buf(),
            line: self.line,
            torn,
            reason: reason.into(),
        }
    }
}

impl Iterator for Replay<'_> {
    type Item = StoreResult<SurveyAnswer>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(StoreError::storage(self.path, e)));
                }
            }
            self.line += 1;

            let terminated = self.buf.last() == Some(&b'\n');
            let content = if terminated {
                &self.buf[..self.buf.len() - 1]
            } else {
                &self.buf[..]
            };

            if content.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            if !terminated {
                let len = content.len();
                return Some(Err(
                    self.corrupt(true, format!("unterminated final line ({len} bytes)"))
                ));
            }

            let text = std::str::from_utf8(content).map(|t| t.trim().to_string());
            let text = match text {
                Ok(t) => t,
                Err(e) => return Some(Err(self.corrupt(false, e.to_string()))),
            };

            return match codec::decode(&text) {
                Ok(answer) => Some(Ok(answer)),
                Err(e) => Some(Err(self.corrupt(false, e.to_string()))),
            };
        }
        None
    }
}

/// Collect a full replay into memory.
pub fn read_all(journal: &dyn Journal) -> StoreResult<Vec<SurveyAnswer>> {
    journal.replay()?.collect()
}
