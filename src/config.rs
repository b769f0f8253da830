use crate::model::TemplateCode;
use crate::record::MAX_LATEST_RUNS;
use crate::template::{self, EventTemplate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const CURRENT_VERSION: i32 = 1;

static TEMPLATE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,62}$").expect("valid regex"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub events: String,
    pub templates: Option<HashMap<String, Template>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Template {
    pub description: String,
    pub before: Vec<String>,
    pub event_and_after: Vec<String>,
    pub should_be_first: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.issues.first() {
            write!(
                f,
                "configuration validation failed: {}: {}",
                first.field, first.message
            )
        } else {
            write!(f, "configuration validation failed")
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    if let Some(templates) = &cfg.templates {
        for (name, template) in templates {
            validate_template_name(&mut issues, name);
            validate_template(&mut issues, name, template);
        }
    }

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

impl Config {
    /// Event templates sorted by name. Without a `templates` section the
    /// built-in set is used.
    pub fn resolve_templates(&self) -> Result<Vec<(String, EventTemplate)>, String> {
        let Some(templates) = &self.templates else {
            return Ok(template::builtin());
        };

        let mut resolved = Vec::with_capacity(templates.len());
        for (name, entry) in templates {
            let before = parse_codes(&entry.before)
                .map_err(|e| format!("template {name:?} before: {e}"))?;
            let after = parse_codes(&entry.event_and_after)
                .map_err(|e| format!("template {name:?} event_and_after: {e}"))?;
            let template = EventTemplate::new(before, after)
                .map_err(|e| format!("template {name:?}: {e}"))?
                .with_should_be_first(entry.should_be_first);
            resolved.push((name.clone(), template));
        }

        resolved.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(resolved)
    }
}

fn parse_codes(codes: &[String]) -> Result<Vec<TemplateCode>, String> {
    codes.iter().map(|code| code.parse::<TemplateCode>()).collect()
}

fn validate_template_name(issues: &mut ValidationErrors, name: &str) {
    if !TEMPLATE_NAME_RE.is_match(name) {
        issues.add(
            format!("templates.{name}"),
            "name must match ^[a-z0-9][a-z0-9_-]{0,62}$",
        );
    }
}

fn validate_template(issues: &mut ValidationErrors, name: &str, template: &Template) {
    let field = format!("templates.{name}");

    if template.event_and_after.is_empty() {
        issues.add(
            format!("{field}.event_and_after"),
            "must contain at least one code",
        );
    }

    for (key, codes) in [
        ("before", &template.before),
        ("event_and_after", &template.event_and_after),
    ] {
        for (idx, code) in codes.iter().enumerate() {
            if code.parse::<TemplateCode>().is_err() {
                issues.add(
                    format!("{field}.{key}[{idx}]"),
                    "must be one of ok, failure, muted_failure, critical_failure, ok_or_failure",
                );
            }
        }
    }

    let total = template.before.len() + template.event_and_after.len();
    if total > MAX_LATEST_RUNS {
        issues.add(
            field,
            format!("pattern length {total} exceeds window capacity {MAX_LATEST_RUNS}"),
        );
    }
}
