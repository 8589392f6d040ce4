// Fixed term lists used by the heuristic scorer.
//
// Matching is plain substring search against lowercased text, so every
// entry here must be lowercase.

/// Terms that commonly appear in genuine disaster reports.
pub const DISASTER_TERMS: &[&str] = &[
    "flood", "earthquake", "cyclone", "hurricane", "tornado", "fire", "tsunami",
    "landslide", "storm", "rescue", "trapped", "injured", "help", "emergency",
    "stranded", "collapsed", "drowning", "evacuation", "shelter", "missing",
    "water", "food", "medical", "children", "elderly", "family", "house",
    "building", "roof", "floor", "ambulance", "hospital",
];

/// Terms typical of payment scams and phishing.
pub const SCAM_TERMS: &[&str] = &[
    "send money", "bank account", "bitcoin", "crypto", "western union",
    "gift card", "wire transfer", "urgent payment", "lottery", "won",
    "prince", "inheritance", "click here", "verify account", "password",
    "social security", "credit card", "claim now", "limited time",
    "act now", "guaranteed", "risk free", "secret", "miracle",
];

/// Guilt-tripping and pressure phrases.
pub const MANIPULATION_PHRASES: &[&str] = &[
    "dying", "last chance", "only you can help", "god will bless",
    "pray for us", "children will die", "blood on your hands",
    "ignore if you have no heart", "share or else", "forward this",
];

/// Count how many distinct entries of `terms` occur in `text`.
pub fn count_matches(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| text.contains(*term)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_terms_are_lowercase() {
        for term in DISASTER_TERMS
            .iter()
            .chain(SCAM_TERMS)
            .chain(MANIPULATION_PHRASES)
        {
            assert_eq!(*term, term.to_lowercase(), "{term} must be lowercase");
        }
    }

    #[test]
    fn repeated_term_counts_once() {
        assert_eq!(count_matches("flood flood flood", DISASTER_TERMS), 1);
    }

    #[test]
    fn substring_matches_count() {
        // "flooding" contains "flood"
        assert_eq!(count_matches("flooding nearby", DISASTER_TERMS), 1);
        assert_eq!(count_matches("nothing to see", SCAM_TERMS), 0);
    }
}
