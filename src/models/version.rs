use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Maximum number of dotted components accepted in a version
const MAX_COMPONENTS: usize = 4;

/// Errors raised while parsing versions and version ranges
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version range '{0}'")]
    InvalidRange(String),
}

/// A dotted numeric version such as `5`, `5.0.6` or `1.2.3.4`
///
/// Missing trailing components compare as zero, so `5` == `5.0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            components: vec![major, minor, patch],
        }
    }

    /// Dotted components as written
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }

    /// The smallest version above every version sharing the first
    /// `index + 1` components, e.g. `5.1.3` bumped at 1 is `5.2`
    ///
    /// `None` when the bumped component is already at its maximum.
    pub fn upper_bound(&self, index: usize) -> Option<Self> {
        let mut components: Vec<u64> = (0..=index).map(|i| self.component(i)).collect();
        if let Some(last) = components.last_mut() {
            *last = last.checked_add(1)?;
        }
        Some(Self { components })
    }

    /// Index of the first non-zero component, or the last index when all are zero
    fn first_non_zero(&self) -> usize {
        self.components
            .iter()
            .position(|c| *c != 0)
            .unwrap_or(self.components.len().saturating_sub(1))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }

        let components = trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::InvalidVersion(s.to_string()))?;

        if components.len() > MAX_COMPONENTS {
            return Err(VersionError::InvalidVersion(s.to_string()));
        }

        Ok(Self { components })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// A single comparison against a version
#[derive(Debug, Clone, PartialEq, Eq)]
enum Constraint {
    Any,
    Eq(Version),
    Gt(Version),
    Ge(Version),
    Lt(Version),
    Le(Version),
}

impl Constraint {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Eq(v) => version == v,
            Self::Gt(v) => version > v,
            Self::Ge(v) => version >= v,
            Self::Lt(v) => version < v,
            Self::Le(v) => version <= v,
        }
    }
}

/// A version range expression in the package manager's syntax
///
/// Alternatives are separated by `||`; each alternative is a whitespace
/// separated list of constraints that must all hold. `~5` means
/// `>=5 <6`, `~5.1.3` means `>=5.1.3 <5.2`, `^5.0.6` means `>=5.0.6 <6`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    expression: String,
    alternatives: Vec<Vec<Constraint>>,
}

impl VersionRange {
    /// The range matching exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            expression: version.to_string(),
            alternatives: vec![vec![Constraint::Eq(version)]],
        }
    }

    /// The expression as written
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Check whether `version` lies inside the range
    pub fn contains(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|conjunction| conjunction.iter().all(|c| c.matches(version)))
    }

    fn parse_term(term: &str, expression: &str) -> Result<Vec<Constraint>, VersionError> {
        let invalid = || VersionError::InvalidRange(expression.to_string());
        let version = |rest: &str| rest.trim().parse::<Version>().map_err(|_| invalid());

        if term == "*" {
            return Ok(vec![Constraint::Any]);
        }

        if let Some(rest) = term.strip_prefix('~') {
            let lower = version(rest)?;
            let index = usize::from(lower.components().len() > 1);
            let upper = lower.upper_bound(index).ok_or_else(invalid)?;
            return Ok(vec![Constraint::Ge(lower), Constraint::Lt(upper)]);
        }

        if let Some(rest) = term.strip_prefix('^') {
            let lower = version(rest)?;
            let upper = lower.upper_bound(lower.first_non_zero()).ok_or_else(invalid)?;
            return Ok(vec![Constraint::Ge(lower), Constraint::Lt(upper)]);
        }

        let constraint = if let Some(rest) = term.strip_prefix(">=") {
            Constraint::Ge(version(rest)?)
        } else if let Some(rest) = term.strip_prefix("<=") {
            Constraint::Le(version(rest)?)
        } else if let Some(rest) = term.strip_prefix('>') {
            Constraint::Gt(version(rest)?)
        } else if let Some(rest) = term.strip_prefix('<') {
            Constraint::Lt(version(rest)?)
        } else if let Some(rest) = term.strip_prefix('=') {
            Constraint::Eq(version(rest)?)
        } else {
            Constraint::Eq(version(term)?)
        };

        Ok(vec![constraint])
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expression = s.trim();
        if expression.is_empty() {
            return Err(VersionError::InvalidRange(s.to_string()));
        }

        let mut alternatives = Vec::new();
        for alternative in expression.split("||") {
            let mut conjunction = Vec::new();
            for term in alternative.split_whitespace() {
                conjunction.extend(Self::parse_term(term, expression)?);
            }
            if conjunction.is_empty() {
                return Err(VersionError::InvalidRange(s.to_string()));
            }
            alternatives.push(conjunction);
        }

        Ok(Self {
            expression: expression.to_string(),
            alternatives,
        })
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.expression
    }
}
