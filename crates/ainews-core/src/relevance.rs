//! Keyword relevance gate for discussion posts.
//!
//! A post is relevant when at least one inclusion keyword appears as a whole
//! word. Exclusion terms are scoped to sentences: an excluded term only
//! disqualifies the post when it shows up in a sentence that has no keyword
//! of its own.

use regex::Regex;

use crate::CoreError;

/// Keywords at or below this length also match hyphenated compounds (`ai-based`).
const SHORT_KEYWORD_LEN: usize = 2;

#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    keywords: Regex,
    exclusions: Vec<String>,
}

impl RelevanceClassifier {
    /// Compile the keyword set into a single boundary-aware pattern.
    ///
    /// Keywords and exclusion terms are lowercased and trimmed; blank entries
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoKeywords`] when no usable keyword remains, or
    /// [`CoreError::InvalidKeyword`] if a pattern fails to compile.
    pub fn new<K, E>(keywords: K, exclusions: E) -> Result<Self, CoreError>
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut alternatives = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            let escaped = regex::escape(&keyword);
            let pattern = if keyword.chars().count() <= SHORT_KEYWORD_LEN {
                format!(r"\b{escaped}(?:\b|-\w)")
            } else {
                format!(r"\b{escaped}\b")
            };
            // Validate each alternative on its own so the error names the keyword.
            Regex::new(&pattern).map_err(|source| CoreError::InvalidKeyword {
                keyword: keyword.clone(),
                source,
            })?;
            alternatives.push(format!("(?:{pattern})"));
        }

        if alternatives.is_empty() {
            return Err(CoreError::NoKeywords);
        }

        let combined = alternatives.join("|");
        let keywords = Regex::new(&combined).map_err(|source| CoreError::InvalidKeyword {
            keyword: combined.clone(),
            source,
        })?;

        let exclusions = exclusions
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();

        Ok(Self {
            keywords,
            exclusions,
        })
    }

    /// `true` when any inclusion keyword matches `text` on word boundaries.
    #[must_use]
    pub fn contains_keyword(&self, text: &str) -> bool {
        !text.is_empty() && self.keywords.is_match(&text.to_lowercase())
    }

    /// Decide whether `text` is in scope.
    #[must_use]
    pub fn is_relevant(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        if !self.contains_keyword(&lowered) {
            return false;
        }

        for term in &self.exclusions {
            if !lowered.contains(term.as_str()) {
                continue;
            }
            let unanchored = lowered.split(['.', '!', '?']).any(|sentence| {
                sentence.contains(term.as_str()) && !self.contains_keyword(sentence)
            });
            if unanchored {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
#[path = "relevance_test.rs"]
mod tests;
