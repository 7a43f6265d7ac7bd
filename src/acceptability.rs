//! Sentence acceptability examples read from the tab-separated corpus format.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::AcceptabilityConfig;
use crate::corpus::for_each_record;
use crate::error::{AcceptabilityError, Result};

/// One labelled sentence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptabilityExample {
    /// Sentence text with surrounding whitespace removed.
    pub sentence: String,
    /// Raw label field.
    pub label: String,
    /// Corpus the sentence was taken from.
    pub source: String,
}

impl AcceptabilityExample {
    /// Binary label (`"1"` acceptable, `"0"` not).
    pub fn binary_label(&self) -> Result<&'static str> {
        preprocess_label(&self.label)
    }
}

/// In-memory list of acceptability examples.
#[derive(Debug, Clone, Default)]
pub struct AcceptabilityDataset {
    examples: Vec<AcceptabilityExample>,
}

impl AcceptabilityDataset {
    /// Reads every line with at least four fields; shorter lines are skipped.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut examples = Vec::new();
        let scan = for_each_record(path, |record| {
            examples.push(AcceptabilityExample {
                sentence: record.sentence.trim().to_string(),
                label: record.label.to_string(),
                source: record.source.to_string(),
            });
            true
        })?;
        info!(
            "loaded {} acceptability examples from {} ({} lines skipped)",
            examples.len(),
            path.display(),
            scan.skipped
        );
        Ok(Self { examples })
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Returns `true` when the file held no qualifying lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Example at `index`.
    pub fn get(&self, index: usize) -> Result<&AcceptabilityExample> {
        self.examples
            .get(index)
            .ok_or(AcceptabilityError::IndexOutOfRange {
                index,
                len: self.examples.len(),
            })
    }

    /// Iterates over the examples in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, AcceptabilityExample> {
        self.examples.iter()
    }

    /// Sentences in file order.
    pub fn sentences(&self) -> impl Iterator<Item = &str> + '_ {
        self.examples.iter().map(|example| example.sentence.as_str())
    }

    /// Counts examples per binary label, as `(acceptable, unacceptable)`.
    pub fn label_counts(&self) -> Result<(usize, usize)> {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for example in &self.examples {
            if example.binary_label()? == "1" {
                positive += 1;
            } else {
                negative += 1;
            }
        }
        Ok((positive, negative))
    }
}

impl<'a> IntoIterator for &'a AcceptabilityDataset {
    type Item = &'a AcceptabilityExample;
    type IntoIter = std::slice::Iter<'a, AcceptabilityExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

/// Maps a numeric label to `"1"` when positive and `"0"` otherwise.
pub fn preprocess_label(label: &str) -> Result<&'static str> {
    let value: f64 = label
        .trim()
        .parse()
        .map_err(|_| AcceptabilityError::InvalidLabel(label.to_string()))?;
    Ok(if value > 0.0 { "1" } else { "0" })
}

/// Splits `sentence` on single spaces, lowercases if configured, and crops or pads the result
/// to exactly [`AcceptabilityConfig::crop_pad_length`] tokens.
#[must_use]
pub fn tokenize(cfg: &AcceptabilityConfig, sentence: &str) -> Vec<String> {
    let mut tokens: Vec<String> = sentence
        .split(' ')
        .take(cfg.crop_pad_length)
        .map(|word| {
            if cfg.lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            }
        })
        .collect();
    tokens.resize(cfg.crop_pad_length, cfg.pad_token.clone());
    tokens
}
