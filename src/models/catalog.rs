use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::version::{Version, VersionRange};

/// Package versions known to be resolvable, keyed by package name
///
/// Stored as TOML:
///
/// ```toml
/// [packages]
/// robotkernel = ["5.0.0", "5.2.1", "6.0.0"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub packages: BTreeMap<String, Vec<Version>>,
}

impl Catalog {
    pub fn contains_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Highest version of `name` lying in every one of `ranges`
    pub fn best_match<'a, I>(&self, name: &str, ranges: I) -> Option<&Version>
    where
        I: IntoIterator<Item = &'a VersionRange> + Clone,
    {
        self.packages
            .get(name)?
            .iter()
            .filter(|version| ranges.clone().into_iter().all(|range| range.contains(version)))
            .max()
    }
}
