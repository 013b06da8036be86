//! Text analysis for the in-memory text index.
//!
//! The pipeline mirrors SQLite's `porter unicode61 remove_diacritics 2`
//! tokenizer closely enough that both backends agree on token counts for
//! Latin-script text:
//!
//! 1. Decompose (NFD) and drop combining marks, so `café` becomes `cafe`.
//! 2. Lowercase.
//! 3. Split on every character that is not alphanumeric.
//! 4. Stem with the Snowball English stemmer.
//!
//! Stemming folds regular inflections (`run`, `runs`, `running`) onto one
//! token. Irregular forms such as `ran` stay distinct.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokenizer + stemmer used for both indexing and querying.
pub struct Analyzer {
    stemmer: Stemmer,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Produce the indexed tokens for `text`, in order, duplicates kept.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        words(text)
            .into_iter()
            .map(|w| self.stemmer.stem(&w).into_owned())
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `text` into lowercase, diacritic-free word tokens without stemming.
pub fn words(text: &str) -> Vec<String> {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build an FTS5 `MATCH` expression that requires every word of `query`.
///
/// Words are cut from the raw query text and left unfolded: FTS5 runs its
/// own tokenizer over each quoted string, so case and diacritic folding
/// happen exactly as they did at index time. Combining marks stay attached
/// to their word, which keeps scripts like Devanagari or pointed Hebrew
/// intact. Each word is emitted as a quoted string, so FTS5 operators
/// (`AND`, `NEAR`, `*`, `:`) typed by a user are matched literally.
/// Returns `None` when the query contains no words.
pub fn fts5_match_expr(query: &str) -> Option<String> {
    let quoted: Vec<String> = query
        .split(|c: char| !(c.is_alphanumeric() || is_combining_mark(c)))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
        .collect();

    if quoted.is_empty() {
        return None;
    }
    Some(quoted.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_and_lowercase() {
        assert_eq!(
            words("Running: From Couch to 5KM"),
            vec!["running", "from", "couch", "to", "5km"]
        );
        assert_eq!(
            words("WarrenBuffett/329993701524918272"),
            vec!["warrenbuffett", "329993701524918272"]
        );
    }

    #[test]
    fn test_words_strip_diacritics() {
        assert_eq!(words("Crème brûlée"), vec!["creme", "brulee"]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(words("").is_empty());
        assert!(words(" -- !! ").is_empty());
        assert_eq!(fts5_match_expr("?!"), None);
    }

    #[test]
    fn test_stemming_folds_regular_inflections() {
        let analyzer = Analyzer::new();
        let run = analyzer.analyze("run");
        assert_eq!(analyzer.analyze("runs"), run);
        assert_eq!(analyzer.analyze("running"), run);
        assert_ne!(analyzer.analyze("ran"), run);
    }

    #[test]
    fn test_fts5_expr_quotes_every_word() {
        assert_eq!(
            fts5_match_expr("beef AND \"chips\"").as_deref(),
            Some("\"beef\" \"AND\" \"chips\"")
        );
    }

    #[test]
    fn test_fts5_expr_keeps_combining_marks() {
        assert_eq!(
            fts5_match_expr("हिन्दी भाषा").as_deref(),
            Some("\"हिन्दी\" \"भाषा\"")
        );
        assert_eq!(fts5_match_expr("שָׁלוֹם!").as_deref(), Some("\"שָׁלוֹם\""));
        assert_eq!(fts5_match_expr("Crème").as_deref(), Some("\"Crème\""));
    }
}
