use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TypingError};

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

const BUILTIN_FILE: &str = "english.json";

/// Supplies passages to type
pub trait TargetTextProvider {
    /// Picks a passage, avoiding `excluding` whenever another one is available
    fn next(&self, excluding: Option<&str>) -> String;
}

/// Fixed list of candidate passages
#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    passages: Vec<String>,
}

impl Corpus {
    pub fn new(name: impl Into<String>, passages: Vec<String>) -> Result<Self> {
        let corpus = Self {
            name: name.into(),
            passages,
        };
        corpus.validate()?;
        Ok(corpus)
    }

    /// Corpus shipped with the binary
    pub fn builtin() -> Result<Self> {
        let file = CORPUS_DIR.get_file(BUILTIN_FILE).ok_or_else(|| {
            TypingError::InvalidInput(format!("corpus file {BUILTIN_FILE} not embedded"))
        })?;
        let contents = file.contents_utf8().ok_or_else(|| {
            TypingError::InvalidInput(format!("corpus file {BUILTIN_FILE} is not UTF-8"))
        })?;
        Self::from_json(contents)
    }

    /// Single user-supplied passage, e.g. from `--prompt`
    pub fn single(text: impl Into<String>) -> Result<Self> {
        Self::new("custom", vec![text.into()])
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let corpus: Corpus = serde_json::from_str(json)?;
        corpus.validate()?;
        Ok(corpus)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.passages.is_empty() {
            return Err(TypingError::InvalidInput(format!(
                "corpus '{}' has no passages",
                self.name
            )));
        }
        if let Some(idx) = self.passages.iter().position(|p| p.is_empty()) {
            return Err(TypingError::InvalidInput(format!(
                "corpus '{}' has an empty passage at index {idx}",
                self.name
            )));
        }
        Ok(())
    }
}

impl TargetTextProvider for Corpus {
    fn next(&self, excluding: Option<&str>) -> String {
        let mut rng = rand::thread_rng();

        let candidates: Vec<&String> = self
            .passages
            .iter()
            .filter(|p| Some(p.as_str()) != excluding)
            .collect();

        match candidates.choose(&mut rng) {
            Some(passage) => passage.to_string(),
            // every passage equals the excluded one
            None => self.passages[0].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_corpus_loads() {
        let corpus = Corpus::builtin().unwrap();

        assert_eq!(corpus.name, "english");
        assert!(corpus.len() >= 10);
        assert!(corpus.passages().iter().all(|p| p.chars().count() > 10));
    }

    #[test]
    fn test_next_avoids_previous_text() {
        let corpus = Corpus::new("pair", vec!["first".into(), "second".into()]).unwrap();

        for _ in 0..50 {
            assert_eq!(corpus.next(Some("first")), "second");
            assert_eq!(corpus.next(Some("second")), "first");
        }
    }

    #[test]
    fn test_next_with_single_passage_repeats_it() {
        let corpus = Corpus::single("only one").unwrap();

        assert_eq!(corpus.next(Some("only one")), "only one");
        assert_eq!(corpus.next(None), "only one");
    }

    #[test]
    fn test_next_returns_a_corpus_passage() {
        let corpus = Corpus::builtin().unwrap();
        let passage = corpus.next(None);

        assert!(corpus.passages().contains(&passage));
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        assert_matches!(
            Corpus::new("none", vec![]),
            Err(TypingError::InvalidInput(_))
        );
        assert_matches!(
            Corpus::new("blank", vec!["ok".into(), String::new()]),
            Err(TypingError::InvalidInput(_))
        );
    }

    #[test]
    fn test_corpus_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "passages": ["hello world", "typing is fun"]
        }
        "#;

        let corpus = Corpus::from_json(json_data).unwrap();

        assert_eq!(corpus.name, "test");
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "file", "passages": ["from disk"]}}"#).unwrap();

        let corpus = Corpus::from_file(file.path()).unwrap();
        assert_eq!(corpus.next(None), "from disk");
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        assert_matches!(
            Corpus::from_file("/definitely/not/here.json"),
            Err(TypingError::Io(_))
        );
    }
}
