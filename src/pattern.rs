//! # Patterns
//!
//! Builds the match expression shared by every collection in one request.
//!
//! ## Escaping
//! User input is never regex syntax. Every metacharacter is escaped so `a.b*c`
//! only matches the literal text and cannot trigger catastrophic backtracking.
//!
//! ## Accents
//! Each letter is folded to its base form and widened to a class of its accented
//! variants, so `maria` matches `María` and `nino` matches `Niño`. The same
//! source string is sent to MongoDB as `$regex` with the `i` option. In-process
//! matching compares folded text instead of compiling anything.
//!
//! ## Anchoring
//! - `prefix`: `^term`
//! - `contains`: `term`
//! - `smart`: `prefix` unless the term is shorter than the configured threshold
use crate::query::MatchMode;

pub const SMART_PREFIX_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Anywhere,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    folded: String,
    anchor: Anchor,
}

impl Pattern {
    /// Regex source for the document store, to be paired with the `i` option.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// In-process equivalent of evaluating [`Pattern::source`] case-insensitively.
    pub fn is_match(&self, value: &str) -> bool {
        let value = fold_str(value);
        match self.anchor {
            Anchor::Start => value.starts_with(&self.folded),
            Anchor::Anywhere => value.contains(&self.folded),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternBuilder {
    smart_prefix_min_chars: usize,
}

impl Default for PatternBuilder {
    fn default() -> Self {
        Self::new(SMART_PREFIX_MIN_CHARS)
    }
}

impl PatternBuilder {
    pub fn new(smart_prefix_min_chars: usize) -> Self {
        Self {
            smart_prefix_min_chars,
        }
    }

    pub fn build(&self, term: &str, mode: MatchMode) -> Pattern {
        let anchor = match mode {
            MatchMode::Prefix => Anchor::Start,
            MatchMode::Contains => Anchor::Anywhere,
            MatchMode::Smart if term.chars().count() < self.smart_prefix_min_chars => {
                Anchor::Anywhere
            }
            MatchMode::Smart => Anchor::Start,
        };

        let folded = fold_str(term);

        let mut source = String::with_capacity(folded.len() * 4 + 1);
        if anchor == Anchor::Start {
            source.push('^');
        }

        for c in folded.chars() {
            match variants(c) {
                Some(class) => source.push_str(class),
                None => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }

        Pattern {
            source,
            folded,
            anchor,
        }
    }
}

pub fn fold_str(value: &str) -> String {
    value.chars().flat_map(char::to_lowercase).map(fold).collect()
}

/// Strips the accent from a lowercase latin letter.
pub fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

fn variants(base: char) -> Option<&'static str> {
    match base {
        'a' => Some("[aáàâäãå]"),
        'e' => Some("[eéèêë]"),
        'i' => Some("[iíìîï]"),
        'o' => Some("[oóòôöõ]"),
        'u' => Some("[uúùûü]"),
        'n' => Some("[nñ]"),
        'c' => Some("[cç]"),
        'y' => Some("[yýÿ]"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(term: &str, mode: MatchMode) -> Pattern {
        PatternBuilder::default().build(term, mode)
    }

    #[test]
    fn test_prefix_only_matches_start() {
        let pattern = build("pan", MatchMode::Prefix);

        assert!(pattern.is_match("Pan Integral"));
        assert!(pattern.is_match("PANADERIA"));
        assert!(!pattern.is_match("Tienda de pan"));
    }

    #[test]
    fn test_contains_matches_anywhere() {
        let pattern = build("pan", MatchMode::Contains);

        assert!(pattern.is_match("Tienda de pan"));
        assert!(pattern.is_match("Pan Integral"));
        assert!(!pattern.is_match("Pasteles"));
    }

    #[test]
    fn test_accent_insensitive() {
        let pattern = build("panaderia", MatchMode::Prefix);
        assert!(pattern.is_match("Panadería Maria"));

        let pattern = build("MARÍA", MatchMode::Contains);
        assert!(pattern.is_match("Panaderia maria"));
        assert!(pattern.is_match("Panadería MARÍA"));

        let pattern = build("nino", MatchMode::Contains);
        assert!(pattern.is_match("El Niño"));
    }

    #[test]
    fn test_smart_short_terms_are_unanchored() {
        let pattern = build("an", MatchMode::Smart);

        assert_eq!(pattern.anchor(), Anchor::Anywhere);
        assert!(pattern.is_match("Pan"));
        assert_eq!(
            pattern.source(),
            build("an", MatchMode::Contains).source()
        );
    }

    #[test]
    fn test_smart_long_terms_are_anchored() {
        let pattern = build("pan", MatchMode::Smart);

        assert_eq!(pattern.anchor(), Anchor::Start);
        assert!(!pattern.is_match("Tienda de pan"));
        assert_eq!(pattern.source(), build("pan", MatchMode::Prefix).source());
    }

    #[test]
    fn test_smart_threshold_counts_chars_not_bytes() {
        // "ñá" is four bytes but two characters.
        assert_eq!(build("ñá", MatchMode::Smart).anchor(), Anchor::Anywhere);
    }

    #[test]
    fn test_configurable_threshold() {
        let builder = PatternBuilder::new(5);
        assert_eq!(builder.build("pana", MatchMode::Smart).anchor(), Anchor::Anywhere);
        assert_eq!(builder.build("panad", MatchMode::Smart).anchor(), Anchor::Start);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let pattern = build("a.b*c", MatchMode::Contains);

        assert!(pattern.is_match("xx a.b*c yy"));
        assert!(!pattern.is_match("axbbc"));
        assert!(!pattern.is_match("abc"));
    }

    #[test]
    fn test_metacharacters_are_escaped_in_source() {
        let pattern = build("a.b*c", MatchMode::Prefix);
        assert_eq!(pattern.source(), r"^[aáàâäãå]\.b\*[cç]");
    }

    #[test]
    fn test_source_agrees_with_is_match() {
        let haystacks = [
            "Pan Integral",
            "Panadería María",
            "tienda de PAN",
            "a.b*c",
            "(a+)+$ zz",
            "El Niño",
            "",
        ];

        for term in ["pan", "maría", "a.b*c", "(a+)+$", "[", "\\", "nino", "?*+"] {
            for mode in [MatchMode::Prefix, MatchMode::Contains, MatchMode::Smart] {
                let pattern = build(term, mode);
                let regex = regex::RegexBuilder::new(pattern.source())
                    .case_insensitive(true)
                    .build()
                    .unwrap();

                for haystack in haystacks {
                    assert_eq!(
                        regex.is_match(haystack),
                        pattern.is_match(haystack),
                        "term {term:?} mode {mode:?} haystack {haystack:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_term_matches_everything() {
        assert!(build("", MatchMode::Contains).is_match("anything"));
    }
}
