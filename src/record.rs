use crate::identity;
use crate::model::{BuildOccurrence, OutcomeCode, RunIdentity, TestOccurrence};
use crate::template::{self, EventTemplate};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use tracing::warn;

/// Capacity of the recent-results window.
pub const MAX_LATEST_RUNS: usize = 50;

/// A window with more adjacent status changes than this is flaky.
pub const FLAKY_STATUS_CHANGES: usize = 6;

/// Run statistics of one test or suite.
///
/// Lifetime counters see every run ever recorded. The window keeps the
/// latest [`MAX_LATEST_RUNS`] outcomes ordered by [`RunIdentity`]; every
/// window-derived query only sees those.
#[derive(Debug, Clone)]
pub struct RunRecord {
    name: String,
    runs: u64,
    failures: u64,
    total_duration_ms: u64,
    runs_with_duration: u64,
    last_updated_ms: i64,
    window: BTreeMap<RunIdentity, OutcomeCode>,
}

impl RunRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: 0,
            failures: 0,
            total_duration_ms: 0,
            runs_with_duration: 0,
            last_updated_ms: 0,
            window: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ingests a test occurrence. Returns `false` and leaves the record
    /// untouched when the occurrence id cannot be decoded.
    pub fn add_test_run(&mut self, occurrence: &TestOccurrence) -> bool {
        let Some(id) = identity::decode(&occurrence.id) else {
            warn!(
                entity = %self.name,
                raw_id = %occurrence.id,
                "unable to parse test occurrence id, skipping"
            );
            return false;
        };

        self.record_test_outcome(id, occurrence.outcome_code(), occurrence.duration);
        true
    }

    pub fn add_build_run(&mut self, build: &BuildOccurrence) {
        self.record_build_outcome(RunIdentity::build(build.build_id), build.is_success());
    }

    pub fn record_test_outcome(
        &mut self,
        id: RunIdentity,
        code: OutcomeCode,
        duration_ms: Option<u64>,
    ) {
        self.runs += 1;

        if let Some(duration) = duration_ms {
            self.total_duration_ms = self.total_duration_ms.saturating_add(duration);
            self.runs_with_duration += 1;
        }

        if code.is_failing() {
            self.failures += 1;
        }

        self.insert_latest(id, code);
        self.touch();
    }

    pub fn record_build_outcome(&mut self, id: RunIdentity, success: bool) {
        self.runs += 1;

        if !success {
            self.failures += 1;
        }

        let code = if success {
            OutcomeCode::Ok
        } else {
            OutcomeCode::Failure
        };

        self.insert_latest(id, code);
        self.touch();
    }

    /// Back-annotates a suite crash onto the window without counting it as
    /// a run.
    pub fn mark_critical_failure(&mut self, container_id: i32) {
        self.insert_latest(RunIdentity::build(container_id), OutcomeCode::CriticalFailure);
    }

    fn insert_latest(&mut self, id: RunIdentity, code: OutcomeCode) {
        self.window.insert(id, code);

        if self.window.len() > MAX_LATEST_RUNS {
            self.window.pop_first();
        }
    }

    fn touch(&mut self) {
        self.last_updated_ms =
            (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    }

    pub fn runs_all_hist(&self) -> u64 {
        self.runs
    }

    pub fn failures_all_hist(&self) -> u64 {
        self.failures
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration_ms
    }

    pub fn runs_with_duration(&self) -> u64 {
        self.runs_with_duration
    }

    /// Unix millis of the last counted run, `0` if none.
    pub fn last_updated_ms(&self) -> i64 {
        self.last_updated_ms
    }

    pub fn lifetime_fail_rate(&self) -> f32 {
        if self.runs == 0 {
            return 1.0;
        }

        self.failures as f32 / self.runs as f32
    }

    pub fn runs_count(&self) -> usize {
        self.window.len()
    }

    pub fn failures_count(&self) -> usize {
        self.window
            .values()
            .filter(|code| **code != OutcomeCode::Ok)
            .count()
    }

    pub fn critical_failures_count(&self) -> usize {
        self.window
            .values()
            .filter(|code| **code == OutcomeCode::CriticalFailure)
            .count()
    }

    /// Share of non-ok results in the window. An empty window reads as
    /// fully failing.
    pub fn fail_rate(&self) -> f32 {
        window_rate(self.failures_count(), self.runs_count())
    }

    pub fn critical_fail_rate(&self) -> f32 {
        window_rate(self.critical_failures_count(), self.runs_count())
    }

    pub fn fail_percent_printable(&self) -> String {
        percent_printable(self.fail_rate() * 100.0)
    }

    pub fn critical_fail_percent_printable(&self) -> String {
        percent_printable(self.critical_fail_rate() * 100.0)
    }

    pub fn fail_percent_all_hist_printable(&self) -> String {
        percent_printable(self.lifetime_fail_rate() * 100.0)
    }

    pub fn average_duration_ms(&self) -> u64 {
        if self.runs_with_duration == 0 {
            return 0;
        }

        self.total_duration_ms / self.runs_with_duration
    }

    pub fn latest_results(&self) -> Vec<OutcomeCode> {
        self.window.values().copied().collect()
    }

    /// Window snapshot in ascending identity order.
    pub fn window(&self) -> Vec<(RunIdentity, OutcomeCode)> {
        self.window.iter().map(|(id, code)| (*id, *code)).collect()
    }

    pub fn status_changes(&self) -> usize {
        self.window
            .values()
            .zip(self.window.values().skip(1))
            .filter(|(prev, next)| prev != next)
            .count()
    }

    pub fn is_flaky(&self) -> bool {
        self.flakiness_report().is_some()
    }

    pub fn flakiness_report(&self) -> Option<String> {
        let changes = self.status_changes();
        if changes <= FLAKY_STATUS_CHANGES {
            return None;
        }

        Some(format!(
            "Test seems to be flaky: change status [{changes}/{}]",
            self.window.len()
        ))
    }

    pub fn detect_template(&self, template: &EventTemplate) -> Option<RunIdentity> {
        template::detect(self, template)
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunRecord{{name='{}', failRate={}%}}",
            self.name,
            self.fail_percent_printable()
        )
    }
}

fn window_rate(count: usize, size: usize) -> f32 {
    if size == 0 {
        return 1.0;
    }

    count as f32 / size as f32
}

/// One decimal, comma as the separator: `33,3`.
pub fn percent_printable(percent: f32) -> String {
    format!("{percent:.1}").replace('.', ",")
}
