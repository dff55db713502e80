//! Repository events and the trigger filters that decide whether a workflow runs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of repository event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Push,
    PullRequest,
    /// Any event this runner has no special name for
    Other(String),
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "push" => EventKind::Push,
            "pull_request" => EventKind::PullRequest,
            _ => EventKind::Other(s),
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        EventKind::from(s.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Push => write!(f, "push"),
            EventKind::PullRequest => write!(f, "pull_request"),
            EventKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A repository event that may trigger a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,

    /// Target branch, without any `refs/heads/` prefix
    pub branch: String,
}

impl Event {
    pub fn new(kind: impl Into<EventKind>, branch: &str) -> Self {
        let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
        Self {
            kind: kind.into(),
            branch: branch.to_string(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.kind, self.branch)
    }
}

/// Branch filter compiled from glob patterns
///
/// `*` matches any run of characters except `/`, `**` matches anything.
/// An empty filter matches every branch.
#[derive(Debug, Clone)]
pub struct BranchFilter {
    compiled: Vec<Regex>,
}

impl BranchFilter {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let compiled = patterns
            .iter()
            .map(|p| Regex::new(&glob_to_regex(p)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { compiled })
    }

    /// Filter that accepts any branch
    pub fn any() -> Self {
        Self {
            compiled: Vec::new(),
        }
    }

    pub fn matches(&self, branch: &str) -> bool {
        self.compiled.is_empty() || self.compiled.iter().any(|r| r.is_match(branch))
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}

/// The set of events a workflow reacts to
#[derive(Debug, Clone, Default)]
pub struct Triggers {
    filters: Vec<(EventKind, BranchFilter)>,
}

impl Triggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to `kind` events on branches accepted by `filter`
    pub fn on(mut self, kind: EventKind, filter: BranchFilter) -> Self {
        self.filters.push((kind, filter));
        self
    }

    /// Whether this event starts a run
    pub fn matches(&self, event: &Event) -> bool {
        self.filters
            .iter()
            .any(|(kind, filter)| *kind == event.kind && filter.matches(&event.branch))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
