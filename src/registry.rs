use crate::model::Occurrence;
use crate::record::RunRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub type SharedRecord = Arc<Mutex<RunRecord>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub skipped: usize,
}

/// Run records keyed by entity name.
///
/// Each record sits behind its own mutex, so work on different names only
/// meets at the map lookup.
#[derive(Debug, Default)]
pub struct Registry {
    records: RwLock<HashMap<String, SharedRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<SharedRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(name).cloned()
    }

    pub fn get_or_create(&self, name: &str) -> SharedRecord {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(RunRecord::new(name))))
            .clone()
    }

    /// Entity names in ascending order.
    pub fn names(&self) -> Vec<String> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = records.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes one occurrence into the record it names. Returns `false` when
    /// the occurrence was dropped.
    pub fn ingest(&self, occurrence: &Occurrence) -> bool {
        let shared = self.get_or_create(occurrence.name());
        let mut record = lock(&shared);

        match occurrence {
            Occurrence::Test(test) => record.add_test_run(test),
            Occurrence::Build(build) => {
                record.add_build_run(build);
                true
            }
            Occurrence::Critical(critical) => {
                record.mark_critical_failure(critical.build_id);
                true
            }
        }
    }

    pub fn ingest_all<'a, I>(&self, occurrences: I) -> IngestSummary
    where
        I: IntoIterator<Item = &'a Occurrence>,
    {
        let mut summary = IngestSummary::default();
        for occurrence in occurrences {
            if self.ingest(occurrence) {
                summary.accepted += 1;
            } else {
                summary.skipped += 1;
            }
        }
        summary
    }

    /// Runs `f` with exclusive access to the named record, if it exists.
    pub fn with_record<T>(&self, name: &str, f: impl FnOnce(&RunRecord) -> T) -> Option<T> {
        let shared = self.get(name)?;
        let record = lock(&shared);
        Some(f(&record))
    }
}

pub fn lock(shared: &SharedRecord) -> MutexGuard<'_, RunRecord> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
