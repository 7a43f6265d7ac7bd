//! Facilities for reading tab-separated corpora line by line.
//!
//! Every corpus line is a record of at least four tab-separated fields:
//! `source \t label \t mark \t sentence`.  Lines with fewer fields are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AcceptabilityError, Result};

/// Minimum number of tab-separated fields a line needs to be considered a record.
pub const MIN_FIELDS: usize = 4;
/// Zero-based index of the sentence field.
pub const SENTENCE_FIELD: usize = 3;

/// Borrowed view of one qualifying corpus line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Field 0: corpus the sentence came from.
    pub source: &'a str,
    /// Field 1: acceptability label.
    pub label: &'a str,
    /// Field 2: annotator mark, unused downstream.
    pub mark: &'a str,
    /// Field 3: raw sentence text.
    pub sentence: &'a str,
}

impl<'a> Record<'a> {
    /// Parses a single line, returning `None` when it has fewer than [`MIN_FIELDS`] fields.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut fields = line.split('\t');
        let source = fields.next()?;
        let label = fields.next()?;
        let mark = fields.next()?;
        let sentence = fields.next()?;
        Some(Self {
            source,
            label,
            mark,
            sentence,
        })
    }

    /// Splits the sentence on single spaces; consecutive spaces yield empty words.
    pub fn words(&self) -> impl Iterator<Item = &'a str> {
        self.sentence.split(' ')
    }
}

/// Counts produced while scanning a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Lines read from the file.
    pub lines: usize,
    /// Lines skipped for having too few fields.
    pub skipped: usize,
}

/// Fails with [`AcceptabilityError::MissingFile`] when `path` does not exist.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(AcceptabilityError::MissingFile {
            path: path.to_path_buf(),
        })
    }
}

/// Streams qualifying records of the corpus at `path` into `visit`.
///
/// `visit` returns `false` to stop reading early; the remainder of the file is not touched.
pub fn for_each_record<P, F>(path: P, mut visit: F) -> Result<ScanSummary>
where
    P: AsRef<Path>,
    F: FnMut(Record<'_>) -> bool,
{
    let path = path.as_ref();
    ensure_exists(path)?;
    let file = File::open(path).map_err(|err| AcceptabilityError::io(err, Some(path.into())))?;
    let mut summary = ScanSummary::default();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|err| AcceptabilityError::io(err, Some(path.into())))?;
        summary.lines += 1;
        match Record::parse(&line) {
            Some(record) => {
                if !visit(record) {
                    break;
                }
            }
            None => summary.skipped += 1,
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_requires_four_fields() {
        assert!(Record::parse("a\tb\tc").is_none());
        let record = Record::parse("src\t1\t*\tthe cat sat").expect("record");
        assert_eq!(record.source, "src");
        assert_eq!(record.label, "1");
        assert_eq!(record.sentence, "the cat sat");
        assert_eq!(record.words().collect::<Vec<_>>(), vec!["the", "cat", "sat"]);
    }

    #[test]
    fn parse_keeps_extra_fields_out_of_sentence() {
        let record = Record::parse("s\t0\t\tone two\textra\r").expect("record");
        assert_eq!(record.mark, "");
        assert_eq!(record.sentence, "one two");
    }

    #[test]
    fn single_space_split_keeps_empty_words() {
        let record = Record::parse("s\t0\t\ta  b").expect("record");
        assert_eq!(record.words().collect::<Vec<_>>(), vec!["a", "", "b"]);
    }

    #[test]
    fn for_each_record_skips_short_lines_and_stops_early() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.tsv");
        fs::write(&path, "a\t1\t\tone\nshort\nb\t0\t\ttwo\nc\t1\t\tthree\n").expect("write");

        let mut seen = Vec::new();
        let summary = for_each_record(&path, |record| {
            seen.push(record.sentence.to_string());
            seen.len() < 2
        })
        .expect("scan");
        assert_eq!(seen, vec!["one", "two"]);
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn missing_corpus_is_reported() {
        let dir = tempdir().expect("tempdir");
        let err = for_each_record(dir.path().join("absent.tsv"), |_| true)
            .expect_err("missing file");
        assert!(matches!(err, AcceptabilityError::MissingFile { .. }));
    }
}
