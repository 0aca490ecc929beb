//! Pattern building: search terms -> one alternation regex.
//!
//! Every literal term is escaped before it is embedded, so regex
//! metacharacters in user searches match literally. Built patterns always
//! wrap the whole alternation in a single capturing group; downstream
//! rewriting reinserts group 1 into generated markup.

use regex::{Regex, RegexBuilder};

/// What a caller may hand to `highlight`: one term, an ordered term list,
/// or a pre-built regex.
///
/// A pre-built regex is used exactly as given; the case-sensitivity
/// configuration is silently ignored for it (the regex carries its own
/// flags). If it contains no capturing group, wrapping falls back to the
/// whole match.
#[derive(Debug, Clone)]
pub enum Pattern {
    Term(String),
    Terms(Vec<String>),
    Compiled(Regex),
}

impl From<&str> for Pattern {
    fn from(term: &str) -> Self {
        Pattern::Term(term.to_string())
    }
}

impl From<String> for Pattern {
    fn from(term: String) -> Self {
        Pattern::Term(term)
    }
}

impl From<Vec<String>> for Pattern {
    fn from(terms: Vec<String>) -> Self {
        Pattern::Terms(terms)
    }
}

impl From<&[&str]> for Pattern {
    fn from(terms: &[&str]) -> Self {
        Pattern::Terms(terms.iter().map(|t| t.to_string()).collect())
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Compiled(re)
    }
}

/// Build the search regex, or `None` for an empty term list (callers treat
/// that as a no-op highlight pass, not an error).
pub fn build_pattern(pattern: Pattern, case_sensitive: bool) -> Option<Regex> {
    match pattern {
        Pattern::Compiled(re) => Some(re),
        Pattern::Term(term) => from_terms(&[term], case_sensitive),
        Pattern::Terms(terms) => from_terms(&terms, case_sensitive),
    }
}

fn from_terms(terms: &[String], case_sensitive: bool) -> Option<Regex> {
    let escaped: Vec<String> = terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if escaped.is_empty() {
        return None;
    }
    let alternation = format!("({})", escaped.join("|"));
    RegexBuilder::new(&alternation)
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_term_list_yields_no_pattern() {
        assert!(build_pattern(Pattern::Terms(vec![]), false).is_none());
        assert!(build_pattern(Pattern::Term(String::new()), false).is_none());
        assert!(build_pattern(Pattern::Terms(vec![String::new()]), false).is_none());
    }

    #[test]
    fn test_metacharacters_match_literally() {
        let re = build_pattern(Pattern::Term("a.b*c".to_string()), false).unwrap();
        assert!(re.is_match("say a.b*c now"));
        assert!(!re.is_match("say axbc now"));
        assert!(!re.is_match("say abc now"));
    }

    #[test]
    fn test_alternation_joins_all_terms() {
        let terms = vec!["cat".to_string(), "dog".to_string()];
        let re = build_pattern(Pattern::Terms(terms), false).unwrap();
        assert!(re.is_match("a dog barked"));
        assert!(re.is_match("a CAT purred"));
    }

    #[test]
    fn test_case_sensitivity_flag() {
        let re = build_pattern(Pattern::Term("hello".to_string()), true).unwrap();
        assert!(re.is_match("hello"));
        assert!(!re.is_match("Hello"));
    }

    #[test]
    fn test_built_pattern_has_whole_match_capture_group() {
        let re = build_pattern(Pattern::Term("hello".to_string()), false).unwrap();
        let caps = re.captures("say Hello").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Hello");
        assert_eq!(caps.get(0).unwrap().as_str(), "Hello");
    }

    #[test]
    fn test_prebuilt_regex_used_unmodified() {
        // Case config is ignored for pre-built patterns: this one stays
        // case-sensitive even though the caller asked for insensitive.
        let custom = Regex::new("(hello)").unwrap();
        let re = build_pattern(Pattern::Compiled(custom), false).unwrap();
        assert!(re.is_match("hello"));
        assert!(!re.is_match("HELLO"));
    }
}
