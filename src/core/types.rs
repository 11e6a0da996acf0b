//! core::types
//!
//! Strong types for release versions and tags.
//!
//! # Types
//!
//! - [`ReleaseVersion`] - Numeric `major.minor.patch` triple
//! - [`ReleaseTag`] - A git tag carrying a release version after a prefix
//! - [`VersionDelta`] - The previous/current release pair applied to params
//!
//! # Validation
//!
//! Versions are accepted only as exactly three dot-separated unsigned
//! integers. Anything else (`1.0`, `X.Y.Z`, `1.0.0-rc1`) is rejected, and
//! tags carrying such versions are filtered out of delta computation.
//!
//! # Examples
//!
//! ```
//! use pipeline_helpers::core::types::{ReleaseTag, VersionDelta, DEFAULT_TAG_PREFIX};
//!
//! let tags = ["release-v1.0.0", "release-v2.0.0", "release-v1.1.0"];
//! let delta = VersionDelta::from_tags(tags, DEFAULT_TAG_PREFIX).unwrap();
//! assert_eq!(delta.from.to_string(), "1.1.0");
//! assert_eq!(delta.to.to_string(), "2.0.0");
//!
//! assert!(ReleaseTag::parse("release-vX.Y.Z", DEFAULT_TAG_PREFIX).is_err());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag prefix used by release pipelines.
pub const DEFAULT_TAG_PREFIX: &str = "release-v";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("release tag is required")]
    MissingTag,

    #[error("'{tag}' must start with '{prefix}'")]
    MissingPrefix { tag: String, prefix: String },

    #[error("invalid semantic version '{0}': the version must follow the MAJOR.MINOR.PATCH format")]
    WrongComponentCount(String),

    #[error("invalid semantic version '{0}': version components must be numbers")]
    NonNumericComponent(String),

    #[error("invalid semantic version '{0}': version components must not have leading zeros")]
    LeadingZero(String),
}

/// A release version: three numeric components compared as a triple.
///
/// # Example
///
/// ```
/// use pipeline_helpers::core::types::ReleaseVersion;
///
/// let v: ReleaseVersion = "1.10.0".parse().unwrap();
/// assert!(v > "1.9.3".parse().unwrap());
/// assert!("1.0".parse::<ReleaseVersion>().is_err());
/// assert!("1.02.0".parse::<ReleaseVersion>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ReleaseVersion {
    /// Create a version from its components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Render as a tag reference (`v1.2.3`), the form used in params files.
    pub fn as_ref_string(&self) -> String {
        format!("v{}", self)
    }
}

impl FromStr for ReleaseVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(TypeError::WrongComponentCount(s.to_string()));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u64::from_str accepts a leading '+', which is not a version digit
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TypeError::NonNumericComponent(s.to_string()));
            }
            // "01" would print back as "1" and name a different tag
            if part.len() > 1 && part.starts_with('0') {
                return Err(TypeError::LeadingZero(s.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| TypeError::NonNumericComponent(s.to_string()))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReleaseVersion> for String {
    fn from(value: ReleaseVersion) -> Self {
        value.to_string()
    }
}

/// A git tag whose name is `<prefix><major>.<minor>.<patch>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTag {
    name: String,
    version: ReleaseVersion,
}

impl ReleaseTag {
    /// Parse a tag name against a prefix.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] describing why the tag is not a release tag.
    pub fn parse(name: &str, prefix: &str) -> Result<Self, TypeError> {
        if name.is_empty() {
            return Err(TypeError::MissingTag);
        }
        let version = name
            .strip_prefix(prefix)
            .ok_or_else(|| TypeError::MissingPrefix {
                tag: name.to_string(),
                prefix: prefix.to_string(),
            })?
            .parse()?;

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    /// The full tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed version.
    pub fn version(&self) -> ReleaseVersion {
        self.version
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Keep only the names that parse as release tags, sorted by version.
///
/// Tags with the same version (impossible for a single prefix, but kept
/// stable anyway) retain their input order.
pub fn sorted_release_tags<I, S>(tags: I, prefix: &str) -> Vec<ReleaseTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed: Vec<ReleaseTag> = tags
        .into_iter()
        .filter_map(|t| ReleaseTag::parse(t.as_ref(), prefix).ok())
        .collect();
    parsed.sort_by_key(|t| t.version);
    parsed
}

/// The previous and current release versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDelta {
    pub from: ReleaseVersion,
    pub to: ReleaseVersion,
}

impl VersionDelta {
    /// Compute the delta from a set of tag names.
    ///
    /// Returns `None` when no name parses as a release tag.
    pub fn from_tags<I, S>(tags: I, prefix: &str) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted = sorted_release_tags(tags, prefix);
        let to = sorted.last()?.version;
        let from = match sorted.len() {
            1 => to,
            n => sorted[n - 2].version,
        };
        Some(Self { from, to })
    }

    /// First-ever release: nothing to move from.
    pub fn is_first_release(&self) -> bool {
        self.from == self.to
    }

    /// `v<from>`
    pub fn from_ref(&self) -> String {
        self.from.as_ref_string()
    }

    /// `v<to>`
    pub fn to_ref(&self) -> String {
        self.to.as_ref_string()
    }
}

impl fmt::Display for VersionDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Validate an operator-supplied release tag such as `release-v1.0.0`.
pub fn validate_release_param(param: &str, prefix: &str) -> Result<ReleaseVersion, TypeError> {
    ReleaseTag::parse(param, prefix).map(|t| t.version())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod release_version {
        use super::*;

        #[test]
        fn parses_three_integers() {
            let v: ReleaseVersion = "1.2.3".parse().unwrap();
            assert_eq!(v, ReleaseVersion::new(1, 2, 3));
            assert_eq!(v.to_string(), "1.2.3");
            assert_eq!(v.as_ref_string(), "v1.2.3");
        }

        #[test]
        fn rejects_wrong_component_count() {
            assert_eq!(
                "1.0".parse::<ReleaseVersion>(),
                Err(TypeError::WrongComponentCount("1.0".into()))
            );
            assert!("1.0.0.0".parse::<ReleaseVersion>().is_err());
            assert!("".parse::<ReleaseVersion>().is_err());
        }

        #[test]
        fn rejects_non_numeric() {
            assert_eq!(
                "X.Y.Z".parse::<ReleaseVersion>(),
                Err(TypeError::NonNumericComponent("X.Y.Z".into()))
            );
            assert!("1.0.0-rc1".parse::<ReleaseVersion>().is_err());
            assert!("1.+2.3".parse::<ReleaseVersion>().is_err());
            assert!("1..3".parse::<ReleaseVersion>().is_err());
        }

        #[test]
        fn rejects_leading_zeros() {
            assert_eq!(
                "1.02.0".parse::<ReleaseVersion>(),
                Err(TypeError::LeadingZero("1.02.0".into()))
            );
            assert!("01.2.0".parse::<ReleaseVersion>().is_err());
            assert_eq!("0.10.0".parse::<ReleaseVersion>(), Ok(ReleaseVersion::new(0, 10, 0)));
        }

        #[test]
        fn orders_numerically_not_lexically() {
            let a: ReleaseVersion = "1.9.0".parse().unwrap();
            let b: ReleaseVersion = "1.10.0".parse().unwrap();
            assert!(a < b);
        }

        #[test]
        fn serde_uses_dotted_string() {
            let v = ReleaseVersion::new(2, 0, 1);
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, "\"2.0.1\"");
            let back: ReleaseVersion = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }
    }

    mod release_tag {
        use super::*;

        #[test]
        fn parses_prefixed_tag() {
            let tag = ReleaseTag::parse("release-v1.0.0", DEFAULT_TAG_PREFIX).unwrap();
            assert_eq!(tag.name(), "release-v1.0.0");
            assert_eq!(tag.version(), ReleaseVersion::new(1, 0, 0));
        }

        #[test]
        fn custom_prefix() {
            let tag = ReleaseTag::parse("ns-mgmt-release-v3.1.4", "ns-mgmt-release-v").unwrap();
            assert_eq!(tag.version(), ReleaseVersion::new(3, 1, 4));
        }

        #[test]
        fn missing_prefix() {
            assert!(matches!(
                ReleaseTag::parse("v1.0.0", DEFAULT_TAG_PREFIX),
                Err(TypeError::MissingPrefix { .. })
            ));
        }

        #[test]
        fn empty_tag() {
            assert_eq!(
                ReleaseTag::parse("", DEFAULT_TAG_PREFIX),
                Err(TypeError::MissingTag)
            );
        }
    }

    mod version_delta {
        use super::*;

        #[test]
        fn takes_two_highest_not_most_recent() {
            let delta = VersionDelta::from_tags(
                ["release-v2.0.0", "release-v1.0.0", "release-v1.1.0"],
                DEFAULT_TAG_PREFIX,
            )
            .unwrap();
            assert_eq!(delta.from, ReleaseVersion::new(1, 1, 0));
            assert_eq!(delta.to, ReleaseVersion::new(2, 0, 0));
            assert!(!delta.is_first_release());
        }

        #[test]
        fn single_tag_is_first_release() {
            let delta = VersionDelta::from_tags(["release-v1.0.0"], DEFAULT_TAG_PREFIX).unwrap();
            assert_eq!(delta.from, delta.to);
            assert!(delta.is_first_release());
        }

        #[test]
        fn no_tags_is_none() {
            let empty: [&str; 0] = [];
            assert!(VersionDelta::from_tags(empty, DEFAULT_TAG_PREFIX).is_none());
        }

        #[test]
        fn malformed_tags_are_excluded() {
            let sorted = sorted_release_tags(
                ["release-v1.0", "release-v1.0.0", "release-vX.Y.Z", "release-v1.02.0"],
                DEFAULT_TAG_PREFIX,
            );
            assert_eq!(sorted.len(), 1);
            assert_eq!(sorted[0].name(), "release-v1.0.0");
        }

        #[test]
        fn unrelated_tags_are_ignored() {
            let delta = VersionDelta::from_tags(
                ["v9.9.9", "release-v0.1.0", "other-release-v5.0.0"],
                DEFAULT_TAG_PREFIX,
            )
            .unwrap();
            assert!(delta.is_first_release());
            assert_eq!(delta.to, ReleaseVersion::new(0, 1, 0));
        }

        #[test]
        fn refs_carry_v_prefix() {
            let delta = VersionDelta {
                from: ReleaseVersion::new(1, 0, 0),
                to: ReleaseVersion::new(1, 1, 0),
            };
            assert_eq!(delta.from_ref(), "v1.0.0");
            assert_eq!(delta.to_ref(), "v1.1.0");
            assert_eq!(delta.to_string(), "1.0.0 to 1.1.0");
        }
    }

    #[test]
    fn validate_release_param_messages() {
        assert!(validate_release_param("release-v1.0.0", DEFAULT_TAG_PREFIX).is_ok());
        assert_eq!(
            validate_release_param("", DEFAULT_TAG_PREFIX),
            Err(TypeError::MissingTag)
        );
        let err = validate_release_param("release-v1.0", DEFAULT_TAG_PREFIX).unwrap_err();
        assert!(err.to_string().contains("MAJOR.MINOR.PATCH"));
    }
}
