//! Naming-variant policy for artefacts published under several suffixes.
//!
//! Scala services are published once per Scala major version, e.g.
//! `auth_2.12`, `auth_2.13` and `auth_3`. When a service is requested by one
//! of those names the resolver does not know which variant carries the
//! newest release, so it walks an ordered candidate list, newest first.
//!
//! The pattern and candidate list are data, not code: callers can inject a
//! different [`NamingVariantPolicy`] to support other conventions.

use super::error::{ArtefactError, Result};
use regex::{NoExpand, Regex};

/// Suffix pattern for Scala cross-built artefact names.
pub const SCALA_SUFFIX_PATTERN: &str = r"_(2\.\d{2}|3)$";

/// Scala suffix candidates, newest major version first.
pub const SCALA_CANDIDATES: [&str; 4] = ["_3", "_2.13", "_2.12", "_2.11"];

/// Separator placed before an explicitly requested variant.
pub const DEFAULT_SEPARATOR: &str = "_";

/// A named rule for detecting and enumerating artefact naming variants.
///
/// # Examples
///
/// ```
/// use sm2_installer::artefact::naming::NamingVariantPolicy;
///
/// let policy = NamingVariantPolicy::scala();
/// assert_eq!(
///     policy.candidate_names("auth_2.12", None),
///     vec!["auth_3", "auth_2.13", "auth_2.12", "auth_2.11"]
/// );
/// assert_eq!(policy.candidate_names("auth_2.12", Some("2.11")), vec!["auth_2.11"]);
/// assert_eq!(policy.candidate_names("frontend", None), vec!["frontend"]);
/// ```
#[derive(Debug, Clone)]
pub struct NamingVariantPolicy {
    pattern: Regex,
    separator: String,
    candidates: Vec<String>,
}

impl NamingVariantPolicy {
    /// Build a policy from a suffix pattern, a separator and an ordered
    /// candidate list.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidVariantPattern`] if the pattern does
    /// not compile and [`ArtefactError::NoVariantCandidates`] if the
    /// candidate list is empty.
    pub fn new<I, S>(pattern: &str, separator: &str, candidates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regex = Regex::new(pattern).map_err(|e| ArtefactError::InvalidVariantPattern {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        let candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        if candidates.is_empty() {
            return Err(ArtefactError::NoVariantCandidates);
        }
        Ok(Self {
            pattern: regex,
            separator: separator.to_owned(),
            candidates,
        })
    }

    /// The Scala cross-build convention.
    #[must_use]
    pub fn scala() -> Self {
        Self {
            pattern: Regex::new(SCALA_SUFFIX_PATTERN).expect("scala suffix pattern is valid"),
            separator: DEFAULT_SEPARATOR.to_owned(),
            candidates: SCALA_CANDIDATES.iter().map(|&s| s.to_owned()).collect(),
        }
    }

    /// Return whether `artifact` carries a recognised variant suffix.
    #[must_use]
    pub fn matches(&self, artifact: &str) -> bool {
        self.pattern.is_match(artifact)
    }

    /// Return the ordered candidate suffixes.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Return the artefact names to query, in order.
    ///
    /// A name without a recognised suffix yields itself. An explicit
    /// variant yields exactly one substituted name; otherwise every
    /// candidate suffix is substituted in priority order.
    #[must_use]
    pub fn candidate_names(&self, artifact: &str, explicit: Option<&str>) -> Vec<String> {
        if !self.matches(artifact) {
            return vec![artifact.to_owned()];
        }
        match explicit {
            Some(variant) => vec![self.substitute(artifact, &self.explicit_suffix(variant))],
            None => self
                .candidates
                .iter()
                .map(|suffix| self.substitute(artifact, suffix))
                .collect(),
        }
    }

    fn explicit_suffix(&self, variant: &str) -> String {
        if variant.starts_with(&self.separator) {
            variant.to_owned()
        } else {
            format!("{}{variant}", self.separator)
        }
    }

    fn substitute(&self, artifact: &str, suffix: &str) -> String {
        self.pattern
            .replace(artifact, NoExpand(suffix))
            .into_owned()
    }
}

impl Default for NamingVariantPolicy {
    fn default() -> Self {
        Self::scala()
    }
}
