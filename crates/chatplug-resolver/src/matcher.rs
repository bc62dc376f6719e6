// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword matching strategies.
//!
//! Pure predicates with no side effects. Keywords are tried in their stored
//! order and the first hit short-circuits the rule to a match.

use chatplug_core::types::MatchingType;
use regex::RegexBuilder;
use tracing::warn;

/// Maximum Levenshtein distance for a fuzzy keyword hit.
const MAX_EDIT_DISTANCE: usize = 2;

/// Does `message` trigger a rule with the given keywords and strategy?
///
/// Strategy notes:
/// - `Word` is a naive case-insensitive substring test, no word-boundary
///   check.
/// - `Fuzzy` compares the entire lower-cased message against each keyword,
///   so the distance grows with message length; it only fires for short
///   messages close to a keyword.
/// - `Regex` compiles each keyword as written, case-insensitive. A keyword
///   that is not a valid pattern counts as a non-match and the remaining
///   keywords are still tried.
/// - `Synonym` has no thesaurus behind it and behaves exactly like `Word`.
pub fn matches(message: &str, keywords: &[String], matching_type: MatchingType) -> bool {
    match matching_type {
        MatchingType::Word | MatchingType::Synonym => word_match(message, keywords),
        MatchingType::Fuzzy => fuzzy_match(message, keywords),
        MatchingType::Regex => regex_match(message, keywords),
    }
}

fn word_match(message: &str, keywords: &[String]) -> bool {
    let message = message.to_lowercase();
    keywords
        .iter()
        .any(|keyword| message.contains(&keyword.to_lowercase()))
}

fn fuzzy_match(message: &str, keywords: &[String]) -> bool {
    let message = message.to_lowercase();
    keywords
        .iter()
        .any(|keyword| strsim::levenshtein(&message, &keyword.to_lowercase()) <= MAX_EDIT_DISTANCE)
}

fn regex_match(message: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| {
        match RegexBuilder::new(keyword).case_insensitive(true).build() {
            Ok(re) => re.is_match(message),
            Err(e) => {
                warn!(keyword = keyword.as_str(), error = %e, "keyword is not a valid regex, skipping");
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn word_match_is_substring_containment() {
        assert!(matches("I need pricing info", &kw(&["pricing"]), MatchingType::Word));
        assert!(!matches("no match here", &kw(&["pricing"]), MatchingType::Word));
        // Substring, not whole-word: "price" is inside "priceless".
        assert!(matches("that is priceless", &kw(&["price"]), MatchingType::Word));
    }

    #[test]
    fn word_match_is_case_insensitive() {
        assert!(matches("PRICING please", &kw(&["pricing"]), MatchingType::Word));
        assert!(matches("pricing please", &kw(&["PRICING"]), MatchingType::Word));
    }

    #[test]
    fn word_match_any_keyword_triggers() {
        let keywords = kw(&["refund", "return", "exchange"]);
        assert!(matches("how do I get a return", &keywords, MatchingType::Word));
        assert!(!matches("hello there", &keywords, MatchingType::Word));
    }

    #[test]
    fn fuzzy_match_tolerates_two_edits() {
        assert!(matches("pricng", &kw(&["pricing"]), MatchingType::Fuzzy));
        assert!(matches("pricing", &kw(&["pricing"]), MatchingType::Fuzzy));
        assert!(matches("PRICNG", &kw(&["pricing"]), MatchingType::Fuzzy));
        assert!(!matches("shipping", &kw(&["pricing"]), MatchingType::Fuzzy));
    }

    #[test]
    fn fuzzy_match_compares_whole_message() {
        // The distance is against the entire message, so a long message
        // never fuzzy-matches a short keyword.
        assert!(!matches(
            "completely unrelated text",
            &kw(&["pricing"]),
            MatchingType::Fuzzy
        ));
        assert!(!matches(
            "I would like to know about pricing",
            &kw(&["pricing"]),
            MatchingType::Fuzzy
        ));
    }

    #[test]
    fn regex_match_uses_keyword_as_pattern() {
        assert!(matches("order #12345", &kw(&["order #\\d+"]), MatchingType::Regex));
        assert!(!matches("order number", &kw(&["order #\\d+"]), MatchingType::Regex));
        assert!(matches("ORDER #9", &kw(&["order #\\d+"]), MatchingType::Regex));
    }

    #[test]
    fn invalid_regex_is_skipped_not_fatal() {
        assert!(!matches("anything", &kw(&["[unterminated"]), MatchingType::Regex));
        // Later keywords are still tried after a broken one.
        assert!(matches(
            "ticket ABC-42",
            &kw(&["[unterminated", "[A-Z]+-\\d+"]),
            MatchingType::Regex
        ));
    }

    #[test]
    fn synonym_match_falls_back_to_substring() {
        assert!(matches("what are your prices", &kw(&["price"]), MatchingType::Synonym));
        // No actual synonym expansion happens.
        assert!(!matches("how much does it cost", &kw(&["price"]), MatchingType::Synonym));
    }

    #[test]
    fn empty_keyword_list_never_matches() {
        for mt in [
            MatchingType::Word,
            MatchingType::Fuzzy,
            MatchingType::Regex,
            MatchingType::Synonym,
        ] {
            assert!(!matches("anything at all", &[], mt));
        }
    }
}
