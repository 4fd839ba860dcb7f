//! Gender-indicating phrase matching
//!
//! Phrases match as whole words: a match must not be preceded or followed by
//! an alphanumeric character. "female" therefore never matches "male", and
//! "manager" never matches "man".

use pgc_common::Gender;

/// Checked first; wins ties
pub const MALE_PHRASES: &[&str] = &["male", "man", "he/him", "he / him"];

pub const FEMALE_PHRASES: &[&str] = &["female", "woman", "she/her", "she / her"];

/// Whole-word phrase detection over lower-cased text
///
/// Male phrases are checked before female phrases, so text containing both
/// sets yields `Male`. Unlike a plain "contains" test, words that merely
/// embed a phrase ("Businessman", "Sales manager") do not match, and
/// "female" never reads as "male". Classifier labels use
/// [`detect_gender_substring`] instead.
pub fn detect_gender(text: &str) -> Option<Gender> {
    let text = text.to_lowercase();

    if MALE_PHRASES.iter().any(|phrase| contains_phrase(&text, phrase)) {
        Some(Gender::Male)
    } else if FEMALE_PHRASES.iter().any(|phrase| contains_phrase(&text, phrase)) {
        Some(Gender::Female)
    } else {
        None
    }
}

/// Plain substring detection for classifier labels such as "Womanly face"
///
/// Female substrings are checked first because each contains a male one.
pub fn detect_gender_substring(text: &str) -> Option<Gender> {
    let text = text.to_lowercase();

    if FEMALE_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        Some(Gender::Female)
    } else if MALE_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        Some(Gender::Male)
    } else {
        None
    }
}

/// Whether `phrase` occurs in `text` bounded by non-alphanumeric characters
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();

        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_boundaries() {
        assert!(contains_phrase("gender: male", "male"));
        assert!(!contains_phrase("gender: female", "male"));
        assert!(!contains_phrase("team manager", "man"));
        assert!(contains_phrase("pronouns (he/him)", "he/him"));
        assert!(!contains_phrase("she/him", "he/him"));
    }

    #[test]
    fn test_both_phrase_sets_male_wins() {
        assert_eq!(detect_gender("Pronouns: he/him. Proud woman-owned shop"), Some(Gender::Male));
    }

    #[test]
    fn test_female_detected() {
        assert_eq!(detect_gender("Gender\nFemale"), Some(Gender::Female));
        assert_eq!(detect_gender("she / her"), Some(Gender::Female));
    }

    #[test]
    fn test_no_phrase() {
        assert_eq!(detect_gender("Works at Humane Society in Germany"), None);
    }

    #[test]
    fn test_embedded_phrases_not_declarations() {
        assert_eq!(detect_gender("Businessman"), None);
        assert_eq!(detect_gender("Sales manager at Acme"), None);
        assert_eq!(detect_gender("Gender: female"), Some(Gender::Female));
    }

    #[test]
    fn test_substring_detection_prefers_female() {
        assert_eq!(detect_gender_substring("Womanly"), Some(Gender::Female));
        assert_eq!(detect_gender_substring("MANLY"), Some(Gender::Male));
        assert_eq!(detect_gender_substring("person"), None);
    }
}
