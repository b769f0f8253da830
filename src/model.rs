use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item id used for build-level identities.
pub const BUILD_ITEM_ID: i32 = 0;

/// Position of one occurrence in an entity's history.
///
/// Ordered by container (build) id first, then item (test) id. Build ids are
/// handed out in increasing order upstream, so ascending identity order is
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    pub container_id: i32,
    pub item_id: i32,
}

impl RunIdentity {
    pub fn new(container_id: i32, item_id: i32) -> Self {
        Self {
            container_id,
            item_id,
        }
    }

    pub fn build(container_id: i32) -> Self {
        Self::new(container_id, BUILD_ITEM_ID)
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container_id, self.item_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    Ok,
    Failure,
    MutedFailure,
    CriticalFailure,
}

impl OutcomeCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeCode::Ok => "ok",
            OutcomeCode::Failure => "failure",
            OutcomeCode::MutedFailure => "muted_failure",
            OutcomeCode::CriticalFailure => "critical_failure",
        }
    }

    /// Counts toward the lifetime `failures` counter.
    pub fn is_failing(self) -> bool {
        matches!(self, OutcomeCode::Failure | OutcomeCode::MutedFailure)
    }

    pub fn symbol(self) -> char {
        match self {
            OutcomeCode::Ok => '.',
            OutcomeCode::Failure => 'x',
            OutcomeCode::MutedFailure => 'm',
            OutcomeCode::CriticalFailure => '!',
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code as it appears inside a template. Only templates can hold the
/// wildcard; windows store [`OutcomeCode`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateCode {
    Is(OutcomeCode),
    OkOrFailure,
}

impl TemplateCode {
    pub const OK: TemplateCode = TemplateCode::Is(OutcomeCode::Ok);
    pub const FAILURE: TemplateCode = TemplateCode::Is(OutcomeCode::Failure);
    pub const MUTED_FAILURE: TemplateCode = TemplateCode::Is(OutcomeCode::MutedFailure);
    pub const CRITICAL_FAILURE: TemplateCode = TemplateCode::Is(OutcomeCode::CriticalFailure);

    pub fn matches(self, stored: OutcomeCode) -> bool {
        match self {
            TemplateCode::Is(code) => code == stored,
            TemplateCode::OkOrFailure => {
                matches!(stored, OutcomeCode::Ok | OutcomeCode::Failure)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateCode::Is(code) => code.as_str(),
            TemplateCode::OkOrFailure => "ok_or_failure",
        }
    }
}

impl From<OutcomeCode> for TemplateCode {
    fn from(code: OutcomeCode) -> Self {
        TemplateCode::Is(code)
    }
}

impl FromStr for TemplateCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(TemplateCode::OK),
            "failure" => Ok(TemplateCode::FAILURE),
            "muted_failure" => Ok(TemplateCode::MUTED_FAILURE),
            "critical_failure" => Ok(TemplateCode::CRITICAL_FAILURE),
            "ok_or_failure" => Ok(TemplateCode::OkOrFailure),
            other => Err(format!("unknown outcome code {other:?}")),
        }
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILURE: &str = "FAILURE";

/// One completed test execution as reported by the CI server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOccurrence {
    pub name: String,
    /// Composite occurrence id, e.g. `id:1044,build:(id:90321)`.
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl TestOccurrence {
    pub fn is_failed(&self) -> bool {
        self.status == STATUS_FAILURE
    }

    pub fn is_not_muted_or_ignored(&self) -> bool {
        !self.muted && !self.ignored
    }

    pub fn outcome_code(&self) -> OutcomeCode {
        if !self.is_failed() {
            OutcomeCode::Ok
        } else if self.is_not_muted_or_ignored() {
            OutcomeCode::Failure
        } else {
            OutcomeCode::MutedFailure
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOccurrence {
    pub name: String,
    pub build_id: i32,
    pub status: String,
}

impl BuildOccurrence {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// A suite that produced no results at all for a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalOccurrence {
    pub name: String,
    pub build_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Occurrence {
    Test(TestOccurrence),
    Build(BuildOccurrence),
    Critical(CriticalOccurrence),
}

impl Occurrence {
    pub fn name(&self) -> &str {
        match self {
            Occurrence::Test(t) => &t.name,
            Occurrence::Build(b) => &b.name,
            Occurrence::Critical(c) => &c.name,
        }
    }

    pub fn kind(&self) -> OccurrenceKind {
        match self {
            Occurrence::Test(_) => OccurrenceKind::Test,
            Occurrence::Build(_) => OccurrenceKind::Build,
            Occurrence::Critical(_) => OccurrenceKind::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceKind {
    Test,
    Build,
    Critical,
}
