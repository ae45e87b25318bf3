//! Memoized survey view.
//!
//! Only ever touched while the store's transaction lock is held.

use crate::projection::Survey;
use crate::store::StoreResult;

/// The last known-durable view and the number of journal records it reflects.
#[derive(Debug)]
pub(crate) struct CachedView {
    pub survey: Survey,
    pub record_count: usize,
}

/// Holds at most one [`CachedView`].
#[derive(Debug, Default)]
pub(crate) struct ViewCache {
    slot: Option<CachedView>,
}

impl ViewCache {
    /// Return the cached view, running `load` to fill an empty cache.
    ///
    /// A failed load leaves the cache empty.
    pub fn get_or_load<F>(&mut self, load: F) -> StoreResult<&mut CachedView>
    where
        F: FnOnce() -> StoreResult<(Survey, usize)>,
    {
        let view = match self.slot.take() {
            Some(view) => view,
            None => {
                let (survey, record_count) = load()?;
                CachedView {
                    survey,
                    record_count,
                }
            }
        };
        Ok(self.slot.insert(view))
    }

    /// Replace the cached view unconditionally.
    pub fn set(&mut self, survey: Survey, record_count: usize) {
        self.slot = Some(CachedView {
            survey,
            record_count,
        });
    }

    /// Drop the cached view; the next access replays the journal.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub const fn is_warm(&self) -> bool {
        self.slot.is_some()
    }
}
