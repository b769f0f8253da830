use crate::model::{OutcomeCode, RunIdentity, TemplateCode};
use crate::record::RunRecord;
use tracing::debug;

/// A run-history pattern locating one notable run, the anchor.
///
/// `before_event` lists the codes expected strictly before the anchor and
/// `event_and_after` starts at the anchor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    before_event: Vec<TemplateCode>,
    event_and_after: Vec<TemplateCode>,
    should_be_first: bool,
}

impl EventTemplate {
    pub fn new(
        before_event: Vec<TemplateCode>,
        event_and_after: Vec<TemplateCode>,
    ) -> Result<Self, String> {
        if event_and_after.is_empty() {
            return Err("event_and_after must contain at least one code".to_string());
        }

        Ok(Self {
            before_event,
            event_and_after,
            should_be_first: false,
        })
    }

    /// When set, only match when the anchor is the entity's very first run.
    pub fn with_should_be_first(mut self, should_be_first: bool) -> Self {
        self.should_be_first = should_be_first;
        self
    }

    pub fn before_event(&self) -> &[TemplateCode] {
        &self.before_event
    }

    pub fn event_and_after(&self) -> &[TemplateCode] {
        &self.event_and_after
    }

    pub fn should_be_first(&self) -> bool {
        self.should_be_first
    }

    pub fn anchor_offset(&self) -> usize {
        self.before_event.len()
    }

    pub fn len(&self) -> usize {
        self.before_event.len() + self.event_and_after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pattern(&self) -> Vec<TemplateCode> {
        self.before_event
            .iter()
            .chain(self.event_and_after.iter())
            .copied()
            .collect()
    }
}

/// Finds the anchor run of `template` in the record's window.
///
/// First-run templates only test the oldest window entry, and only while
/// the window still holds every run ever recorded. Other templates scan
/// from the newest possible start backwards and report the latest match.
pub fn detect(record: &RunRecord, template: &EventTemplate) -> Option<RunIdentity> {
    let pattern = template.pattern();
    let anchor = template.anchor_offset();
    let history = record.window();

    if history.len() < pattern.len() {
        return None;
    }

    let found = if template.should_be_first() {
        if history.len() as u64 >= record.runs_all_hist() {
            match_at(&pattern, anchor, &history, 0)
        } else {
            None
        }
    } else {
        (0..=history.len() - pattern.len())
            .rev()
            .find_map(|start| match_at(&pattern, anchor, &history, start))
    };

    if let Some(id) = found {
        debug!(entity = record.name(), anchor = %id, "template matched");
    }

    found
}

fn match_at(
    pattern: &[TemplateCode],
    anchor: usize,
    history: &[(RunIdentity, OutcomeCode)],
    start: usize,
) -> Option<RunIdentity> {
    let slice = history.get(start..start + pattern.len())?;

    let all_match = pattern
        .iter()
        .zip(slice)
        .all(|(expected, (_, stored))| expected.matches(*stored));

    if all_match {
        Some(slice[anchor].0)
    } else {
        None
    }
}

pub const NEW_FAILURE: &str = "new_failure";
pub const NEW_CONTRIBUTED_TEST_FAILURE: &str = "new_contributed_test_failure";
pub const NEW_CRITICAL_FAILURE: &str = "new_critical_failure";
pub const FIXED_FAILURE: &str = "fixed_failure";

/// Templates used when no configuration declares any, sorted by name.
pub fn builtin() -> Vec<(String, EventTemplate)> {
    use TemplateCode as C;

    let entries = [
        (
            FIXED_FAILURE,
            vec![C::FAILURE; 3],
            vec![C::OK; 5],
            false,
        ),
        (
            NEW_CONTRIBUTED_TEST_FAILURE,
            Vec::new(),
            vec![C::FAILURE; 4],
            true,
        ),
        (
            NEW_CRITICAL_FAILURE,
            vec![C::OkOrFailure; 5],
            vec![C::CRITICAL_FAILURE; 4],
            false,
        ),
        (NEW_FAILURE, vec![C::OK; 5], vec![C::FAILURE; 4], false),
    ];

    entries
        .into_iter()
        .map(|(name, before, after, first)| {
            let template = EventTemplate {
                before_event: before,
                event_and_after: after,
                should_be_first: first,
            };
            (name.to_string(), template)
        })
        .collect()
}
