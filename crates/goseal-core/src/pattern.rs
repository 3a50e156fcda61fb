//! Ordered sets of compiled regular expressions.

use crate::config::model::ModelError;
use regex::Regex;
use std::fmt;

/// A single compiled pattern that remembers its source text.
#[derive(Clone)]
pub struct Pattern {
    raw: String,
    compiled: Regex,
}

impl Pattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPattern`] if the regex does not compile.
    pub fn new(raw: &str) -> Result<Self, ModelError> {
        let compiled = Regex::new(raw).map_err(|e| ModelError::InvalidPattern {
            pattern: raw.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: raw.to_string(),
            compiled,
        })
    }

    /// Unanchored search: true when the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.raw)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

/// Ordered collection of patterns with an "any match" predicate.
///
/// What an empty set means is decided by each caller; this type only answers
/// [`PatternSet::any_match`], which is `false` for an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every pattern, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the error of the first pattern that does not compile.
    pub fn compile<I, S>(patterns: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Builds a set from already compiled patterns.
    #[must_use]
    pub fn from_patterns(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// True if any pattern matches `text`.
    #[must_use]
    pub fn any_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// True if the set holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Iterates over the patterns in order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
