use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::version::{VersionError, VersionRange};

/// Errors raised while parsing a package reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("Invalid package reference '{0}' (expected name/version[@user/channel])")]
    Malformed(String),

    #[error("Invalid package name '{0}'")]
    InvalidName(String),

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// A reference to another package, e.g. `robotkernel/[~5]@robotkernel/stable`
///
/// The version part is either a plain version or a range in brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageReference {
    pub name: String,
    pub range: VersionRange,
    pub user: Option<String>,
    pub channel: Option<String>,
}

impl PackageReference {
    /// Whether the version part was written as a bracketed range
    pub fn is_range(&self) -> bool {
        self.range.expression().contains(|c: char| !c.is_ascii_digit() && c != '.')
    }

    fn validate_name(name: &str) -> Result<(), ReferenceError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '+')
            && !name.starts_with(['-', '.']);

        if valid {
            Ok(())
        } else {
            Err(ReferenceError::InvalidName(name.to_string()))
        }
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range() {
            write!(f, "{}/[{}]", self.name, self.range)?;
        } else {
            write!(f, "{}/{}", self.name, self.range)?;
        }
        if let (Some(user), Some(channel)) = (&self.user, &self.channel) {
            write!(f, "@{user}/{channel}")?;
        }
        Ok(())
    }
}

impl FromStr for PackageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ReferenceError::Malformed(s.to_string());

        let (rest, user_channel) = match s.rfind('@') {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };

        let (user, channel) = match user_channel {
            Some(uc) => {
                let (user, channel) = uc.split_once('/').ok_or_else(malformed)?;
                if user.is_empty() || channel.is_empty() {
                    return Err(malformed());
                }
                (Some(user.to_string()), Some(channel.to_string()))
            }
            None => (None, None),
        };

        let (name, version) = rest.split_once('/').ok_or_else(malformed)?;
        Self::validate_name(name)?;

        let range = match version.strip_prefix('[') {
            Some(inner) => inner.strip_suffix(']').ok_or_else(malformed)?.parse()?,
            None => VersionRange::exact(version.parse()?),
        };

        Ok(Self {
            name: name.to_string(),
            range,
            user,
            channel,
        })
    }
}

impl TryFrom<String> for PackageReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageReference> for String {
    fn from(reference: PackageReference) -> Self {
        reference.to_string()
    }
}
