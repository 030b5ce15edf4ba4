use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Maps a lowercased word to its base form.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, word: &str) -> String;
}

#[derive(Debug, Error)]
pub enum LemmaError {
    #[error("Failed to read lemma resource {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed lemma resource: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid lemma exception at line {line}: {fields:?} (expected `form,lemma`)")]
    Record { line: u64, fields: Vec<String> },
    #[error("In {path}: {source}")]
    File {
        path: PathBuf,
        source: Box<LemmaError>,
    },
}

/// Irregular plural forms the suffix rules would get wrong.
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("thieves", "thief"),
    ("wives", "wife"),
    ("wolves", "wolf"),
];

/// Words ending in `s` that are already base forms.
const PROTECTED_FORMS: &[&str] = &[
    "afterwards",
    "always",
    "besides",
    "christmas",
    "does",
    "goes",
    "hers",
    "means",
    "news",
    "ours",
    "perhaps",
    "series",
    "sometimes",
    "species",
    "thanks",
    "theirs",
    "towards",
    "upstairs",
    "whereas",
    "yours",
];

/// Endings that mark a singular word (`class`, `bus`, `thesis`, `physics`).
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is", "ics"];

const MIN_LEMMA_LEN: usize = 3;

/// Rule-based English noun lemmatizer.
///
/// Exceptions (built-in irregulars plus any loaded file) win. Otherwise one
/// suffix rule may fire: `sses/xes/zes/ches/shes` drop `es`, `ies` becomes
/// `y`, `men` becomes `man`, and a trailing `s` is dropped. Protected words
/// and endings, non-alphabetic words, and rewrites shorter than three
/// characters are kept as they are.
///
/// Once a lemma list is loaded, a rule rewrite is only accepted when the
/// result is a listed lemma, and listed words are never rewritten.
#[derive(Debug, Clone)]
pub struct EnglishLemmatizer {
    exceptions: HashMap<String, String>,
    known_lemmas: Option<HashSet<String>>,
}

impl Default for EnglishLemmatizer {
    fn default() -> Self {
        Self {
            exceptions: IRREGULAR_FORMS
                .iter()
                .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
                .collect(),
            known_lemmas: None,
        }
    }
}

fn resource_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn open_resource(path: &Path) -> Result<std::fs::File, LemmaError> {
    std::fs::File::open(path).map_err(|source| LemmaError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn in_file(path: &Path) -> impl FnOnce(LemmaError) -> LemmaError + '_ {
    move |err| LemmaError::File {
        path: path.to_path_buf(),
        source: Box::new(err),
    }
}

impl EnglishLemmatizer {
    /// Add `form,lemma` records read from `reader`, overriding built-ins.
    ///
    /// Blank lines and `#` comments are skipped; any other record must hold
    /// exactly two non-empty fields.
    pub fn with_exceptions_from_reader<R: Read>(mut self, reader: R) -> Result<Self, LemmaError> {
        for record in resource_reader(reader).records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            match (record.len(), record.get(0), record.get(1)) {
                (2, Some(form), Some(lemma)) if !form.is_empty() && !lemma.is_empty() => {
                    self.exceptions
                        .insert(form.to_lowercase(), lemma.to_lowercase());
                }
                _ => {
                    return Err(LemmaError::Record {
                        line: record.position().map_or(0, |pos| pos.line()),
                        fields: record.iter().map(str::to_string).collect(),
                    });
                }
            }
        }
        Ok(self)
    }

    pub fn with_exceptions_file(self, path: &Path) -> Result<Self, LemmaError> {
        let file = open_resource(path)?;
        self.with_exceptions_from_reader(file).map_err(in_file(path))
    }

    /// Restrict rule rewrites to the lemmas listed in `reader`: one or more
    /// comma-separated words per line, `#` comments allowed.
    pub fn with_lemma_list_from_reader<R: Read>(mut self, reader: R) -> Result<Self, LemmaError> {
        let known = self.known_lemmas.get_or_insert_with(HashSet::new);
        for record in resource_reader(reader).records() {
            let record = record?;
            known.extend(
                record
                    .iter()
                    .filter(|word| !word.is_empty())
                    .map(str::to_lowercase),
            );
        }
        Ok(self)
    }

    pub fn with_lemma_list_file(self, path: &Path) -> Result<Self, LemmaError> {
        let file = open_resource(path)?;
        self.with_lemma_list_from_reader(file).map_err(in_file(path))
    }

    fn is_protected(word: &str) -> bool {
        PROTECTED_FORMS.contains(&word)
            || PROTECTED_ENDINGS.iter().any(|ending| word.ends_with(ending))
    }

    fn apply_suffix_rules(word: &str) -> Option<String> {
        let rewritten = if ["sses", "xes", "zes", "ches", "shes"]
            .iter()
            .any(|suffix| word.ends_with(suffix))
        {
            word[..word.len() - 2].to_string()
        } else if let Some(stem) = word.strip_suffix("ies") {
            format!("{stem}y")
        } else if let Some(stem) = word.strip_suffix("men") {
            format!("{stem}man")
        } else if let Some(stem) = word.strip_suffix('s') {
            stem.to_string()
        } else {
            return None;
        };
        (rewritten.chars().count() >= MIN_LEMMA_LEN).then_some(rewritten)
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return lemma.clone();
        }
        if !word.chars().all(char::is_alphabetic) || Self::is_protected(word) {
            return word.to_string();
        }
        if let Some(known) = &self.known_lemmas {
            if known.contains(word) {
                return word.to_string();
            }
            return Self::apply_suffix_rules(word)
                .filter(|lemma| known.contains(lemma))
                .unwrap_or_else(|| word.to_string());
        }
        Self::apply_suffix_rules(word).unwrap_or_else(|| word.to_string())
    }
}

/// Lemmatizer that leaves every word untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_plural_rules() {
        let lemmatizer = EnglishLemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("jokes"), "joke");
        assert_eq!(lemmatizer.lemmatize("boxes"), "box");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
        assert_eq!(lemmatizer.lemmatize("churches"), "church");
        assert_eq!(lemmatizer.lemmatize("dishes"), "dish");
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        assert_eq!(lemmatizer.lemmatize("women"), "woman");
    }

    #[test]
    fn keeps_protected_and_short_words() {
        let lemmatizer = EnglishLemmatizer::default();
        for word in ["is", "was", "yes", "his", "class", "bus", "thesis", "hello", "hi"] {
            assert_eq!(lemmatizer.lemmatize(word), word, "{word}");
        }
    }

    #[test]
    fn common_non_plurals_are_not_stripped() {
        let lemmatizer = EnglishLemmatizer::default();
        for word in ["news", "always", "does", "goes", "series", "physics", "thanks"] {
            assert_eq!(lemmatizer.lemmatize(word), word, "{word}");
        }
        assert_ne!(lemmatizer.lemmatize("news"), lemmatizer.lemmatize("new"));
    }

    #[test]
    fn non_alphabetic_tokens_pass_through() {
        let lemmatizer = EnglishLemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("hours!"), "hours!");
        assert_eq!(lemmatizer.lemmatize("24/7s"), "24/7s");
    }

    #[test]
    fn irregular_forms_use_table() {
        let lemmatizer = EnglishLemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("leaves"), "leaf");
        assert_eq!(lemmatizer.lemmatize("mice"), "mouse");
    }

    #[test]
    fn exceptions_reader_overrides_rules() {
        let extra: &[u8] = b"# custom forms\n\nhours, hours\nPeople,person\n";
        let lemmatizer = EnglishLemmatizer::default()
            .with_exceptions_from_reader(extra)
            .unwrap();
        assert_eq!(lemmatizer.lemmatize("hours"), "hours");
        assert_eq!(lemmatizer.lemmatize("people"), "person");
        assert_eq!(lemmatizer.lemmatize("jokes"), "joke");
    }

    #[test]
    fn exceptions_reader_rejects_single_field() {
        let extra: &[u8] = b"good,line\nbroken\n";
        let err = EnglishLemmatizer::default()
            .with_exceptions_from_reader(extra)
            .unwrap_err();
        assert!(matches!(err, LemmaError::Record { line: 2, .. }));
    }

    #[test]
    fn exceptions_reader_rejects_extra_fields() {
        let extra: &[u8] = b"people,person,extra\n";
        match EnglishLemmatizer::default().with_exceptions_from_reader(extra) {
            Err(LemmaError::Record { line, fields }) => {
                assert_eq!(line, 1);
                assert_eq!(fields, vec!["people", "person", "extra"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lemma_list_gates_rule_rewrites() {
        let list: &[u8] = b"# known lemmas\njoke, story\nnew\n";
        let lemmatizer = EnglishLemmatizer::default()
            .with_lemma_list_from_reader(list)
            .unwrap();
        assert_eq!(lemmatizer.lemmatize("jokes"), "joke");
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        // rewrites to words outside the list are refused
        assert_eq!(lemmatizer.lemmatize("hours"), "hours");
        assert_eq!(lemmatizer.lemmatize("lens"), "lens");
        assert_eq!(lemmatizer.lemmatize("new"), "new");
        assert_eq!(lemmatizer.lemmatize("children"), "child");
    }

    #[test]
    fn missing_exceptions_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = EnglishLemmatizer::default()
            .with_exceptions_file(&path)
            .unwrap_err();
        match err {
            LemmaError::Read { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn malformed_exceptions_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.txt");
        std::fs::write(&path, "a,b,c\n").unwrap();
        let err = EnglishLemmatizer::default()
            .with_exceptions_file(&path)
            .unwrap_err();
        assert!(matches!(err, LemmaError::File { .. }));
        assert!(err.to_string().contains("lemmas.txt"));
    }
}
