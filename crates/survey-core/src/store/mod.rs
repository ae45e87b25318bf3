//! Survey store: the transaction coordinator over the answer journal.
//!
//! Every read-modify-append cycle runs under one store-wide mutex:
//!
//! 1. load the current view (cached, or replayed from the journal),
//! 2. run the caller's mutation, which may stage new answers,
//! 3. durably append exactly the staged answers,
//! 4. publish them into the cached view.
//!
//! A failed mutation writes nothing and leaves the cache as it was. A failed
//! append drops the cache so the next transaction re-derives state from the
//! journal instead of trusting memory.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use survey_core::{CloneCatalog, SurveyStore};
//!
//! let catalog = CloneCatalog::load_dir(Path::new("/data/clones")).unwrap();
//! let store = SurveyStore::open(Path::new("/data/survey"), catalog).unwrap();
//! let unanswered = store
//!     .transact(|txn| Ok(txn.survey().unanswered().len()))
//!     .unwrap();
//! ```

mod cache;
pub mod errors;

pub use errors::{StoreError, StoreResult};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::CloneCatalog;
use crate::journal::{FileJournal, Journal};
use crate::model::{validate_questions, Question, SurveyAnswer};
use crate::projection::{build_view, Survey};

use cache::ViewCache;

/// File holding the question list, written once at creation.
pub const QUESTIONS_FILE: &str = "questions";

/// The answer journal.
pub const ANSWERS_FILE: &str = "answers";

/// Scratch name for the question file while it is being written.
const QUESTIONS_STAGING_FILE: &str = "questions.tmp";

/// Path to the question file of a store directory.
pub fn questions_path(dir: &Path) -> PathBuf {
    dir.join(QUESTIONS_FILE)
}

/// Path to the answer journal of a store directory.
pub fn answers_path(dir: &Path) -> PathBuf {
    dir.join(ANSWERS_FILE)
}

/// Whether a survey has been created in `dir`.
pub fn is_initialized(dir: &Path) -> bool {
    questions_path(dir).is_file()
}

/// Single-writer store of survey answers.
pub struct SurveyStore<J: Journal = FileJournal> {
    questions: Arc<[Question]>,
    catalog: Arc<CloneCatalog>,
    journal: J,
    cache: Mutex<ViewCache>,
}

impl SurveyStore<FileJournal> {
    /// Create a new survey in `dir`.
    ///
    /// Creates the directory if needed, persists the question list and an
    /// empty answer journal. Fails if a survey already exists there.
    pub fn create(dir: &Path, questions: Vec<Question>, catalog: CloneCatalog) -> StoreResult<Self> {
        validate_questions(&questions).map_err(StoreError::InvalidQuestions)?;
        ensure_dir(dir)?;

        write_questions(dir, &questions)?;

        tracing::info!(
            dir = %dir.display(),
            questions = questions.len(),
            clones = catalog.count(),
            "created survey store"
        );

        Self::with_journal(questions, catalog, FileJournal::new(answers_path(dir)))
    }

    /// Open an existing survey in `dir`.
    pub fn open(dir: &Path, catalog: CloneCatalog) -> StoreResult<Self> {
        let questions = load_questions(dir)?;
        Self::with_journal(questions, catalog, FileJournal::new(answers_path(dir)))
    }
}

impl<J: Journal> SurveyStore<J> {
    /// Build a store over any journal.
    ///
    /// Validates the question list and ensures the journal exists.
    pub fn with_journal(
        questions: Vec<Question>,
        catalog: CloneCatalog,
        journal: J,
    ) -> StoreResult<Self> {
        validate_questions(&questions).map_err(StoreError::InvalidQuestions)?;
        journal.ensure()?;
        Ok(Self {
            questions: Arc::from(questions),
            catalog: Arc::new(catalog),
            journal,
            cache: Mutex::new(ViewCache::default()),
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn catalog(&self) -> &CloneCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn journal(&self) -> &J {
        &self.journal
    }

    /// Run one exclusive load → mutate → append cycle.
    ///
    /// `mutate` sees the current view through a [`SurveyTxn`] and stages new
    /// answers with [`SurveyTxn::record`]. Staged answers are durable before
    /// this returns `Ok`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TransactionAborted`] if `mutate` fails; nothing written.
    /// - [`StoreError::AppendFailed`] if the append could not be made durable;
    ///   the mutation must be treated as not committed.
    /// - Load errors ([`StoreError::StorageUnavailable`],
    ///   [`StoreError::CorruptRecord`]) from a cold cache.
    #[tracing::instrument(skip_all, fields(journal = %self.journal.path().display()))]
    pub fn transact<T, F>(&self, mutate: F) -> StoreResult<T>
    where
        F: FnOnce(&mut SurveyTxn<'_>) -> anyhow::Result<T>,
    {
        let mut cache = self.lock_cache();
        let view = cache.get_or_load(|| self.load())?;

        let mut txn = SurveyTxn {
            survey: &view.survey,
            staged: Vec::new(),
        };
        let value = match mutate(&mut txn) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "transaction aborted by mutation");
                return Err(StoreError::TransactionAborted(e));
            }
        };
        let staged = txn.staged;

        if staged.is_empty() {
            return Ok(value);
        }

        if let Err(e) = self.journal.append(&staged) {
            tracing::warn!(error = %e, staged = staged.len(), "append failed, dropping cached view");
            cache.invalidate();
            return Err(e);
        }

        let record_count = view.record_count + staged.len();
        for answer in staged {
            view.survey.apply(answer);
        }
        view.record_count = record_count;

        tracing::debug!(record_count, "transaction committed");
        Ok(value)
    }

    /// A copy of the current view.
    pub fn snapshot(&self) -> StoreResult<Survey> {
        self.transact(|txn| Ok(txn.survey().clone()))
    }

    /// Number of records reflected by the current view.
    pub fn record_count(&self) -> StoreResult<usize> {
        let mut cache = self.lock_cache();
        Ok(cache.get_or_load(|| self.load())?.record_count)
    }

    /// Discard the cached view and replay the journal.
    ///
    /// Returns the number of records replayed.
    pub fn reload(&self) -> StoreResult<usize> {
        let mut cache = self.lock_cache();
        cache.invalidate();
        let (survey, record_count) = self.load()?;
        cache.set(survey, record_count);
        Ok(record_count)
    }

    fn load(&self) -> StoreResult<(Survey, usize)> {
        let (survey, record_count) = build_view(
            Arc::clone(&self.questions),
            Arc::clone(&self.catalog),
            self.journal.replay()?,
        )?;
        tracing::debug!(
            record_count,
            unanswered = survey.unanswered().len(),
            "replayed answer journal"
        );
        Ok((survey, record_count))
    }

    /// A panic inside a transaction poisons the lock; the cached view is
    /// then discarded rather than trusted.
    fn lock_cache(&self) -> MutexGuard<'_, ViewCache> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("survey store lock poisoned, discarding cached view");
            let mut guard = poisoned.into_inner();
            guard.invalidate();
            self.cache.clear_poison();
            guard
        })
    }
}

/// Handle given to a transaction's mutation.
pub struct SurveyTxn<'a> {
    survey: &'a Survey,
    staged: Vec<SurveyAnswer>,
}

impl SurveyTxn<'_> {
    /// The committed view at the start of the transaction.
    #[must_use]
    pub const fn survey(&self) -> &Survey {
        self.survey
    }

    /// Answers staged so far in this transaction.
    #[must_use]
    pub fn staged(&self) -> &[SurveyAnswer] {
        &self.staged
    }

    /// Stage one answer for append.
    ///
    /// Rejects answers for clones outside the catalog, answers whose
    /// responses do not line up with the question list (count, order, and
    /// each answer fitting its question's kind), and non-finite selection
    /// probabilities.
    pub fn record(&mut self, answer: SurveyAnswer) -> StoreResult<()> {
        let count = self.survey.catalog().count();
        if answer.clone_index >= count {
            return Err(StoreError::UnknownClone {
                index: answer.clone_index,
                count,
            });
        }

        let questions = self.survey.questions().len();
        if answer.responses.len() != questions {
            return Err(StoreError::InvalidRecord(format!(
                "{} responses for {questions} questions",
                answer.responses.len()
            )));
        }
        for (pos, (r, question)) in answer
            .responses
            .iter()
            .zip(self.survey.questions())
            .enumerate()
        {
            if r.question != pos {
                return Err(StoreError::InvalidRecord(format!(
                    "response {pos} answers question {}",
                    r.question
                )));
            }
            question
                .check_answer(&r.answer)
                .map_err(StoreError::InvalidRecord)?;
        }

        if !answer.selection_pr.is_finite() {
            return Err(StoreError::InvalidRecord(format!(
                "selection probability {} is not finite",
                answer.selection_pr
            )));
        }

        self.staged.push(answer);
        Ok(())
    }
}

/// Persist the question list without ever exposing a partial file.
///
/// The list is written and synced under a staging name, then hard-linked into
/// place. Linking fails if `questions` already exists, so two concurrent
/// creators cannot both succeed.
fn write_questions(dir: &Path, questions: &[Question]) -> StoreResult<()> {
    let path = questions_path(dir);
    if path.exists() {
        return Err(StoreError::AlreadyInitialized {
            path: dir.to_path_buf(),
        });
    }

    let mut json = serde_json::to_string_pretty(questions)
        .map_err(|e| StoreError::InvalidQuestions(e.to_string()))?;
    json.push('\n');

    let staging = dir.join(QUESTIONS_STAGING_FILE);
    let result = stage_file(&staging, json.as_bytes())
        .map_err(|e| StoreError::storage(&staging, e))
        .and_then(|()| match fs::hard_link(&staging, &path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyInitialized {
                    path: dir.to_path_buf(),
                })
            }
            Err(e) => Err(StoreError::storage(&path, e)),
        });

    if let Err(e) = fs::remove_file(&staging) {
        tracing::debug!(
            path = %staging.display(),
            error = %e,
            "could not remove staged question file"
        );
    }
    result
}

fn stage_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn ensure_dir(dir: &Path) -> StoreResult<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::storage(
            dir,
            std::io::Error::other("not a directory"),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| StoreError::storage(dir, e))
        }
        Err(e) => Err(StoreError::storage(dir, e)),
    }
}

/// Read the persisted question list of a store directory.
pub fn load_questions(dir: &Path) -> StoreResult<Vec<Question>> {
    let path = questions_path(dir);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotInitialized {
                path: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(StoreError::storage(&path, e)),
    };
    serde_json::from_str(&content)
        .map_err(|e| StoreError::InvalidQuestions(format!("{}: {e}", path.display())))
}
