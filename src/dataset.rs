//! Fixed-length next-token-prediction windows over a [`TokenStream`].

use std::path::Path;

use rayon::prelude::*;

use crate::config::StreamConfig;
use crate::error::{AcceptabilityError, Result};
use crate::stream::TokenStream;
use crate::vocab::{TokenId, Vocabulary};

/// One training example: `input` and the same window shifted one id later.
pub type Window<'a> = (&'a [TokenId], &'a [TokenId]);

/// Language-model dataset slicing a token stream into consecutive windows of `seq_length` ids.
///
/// Inputs of consecutive items never overlap; each target repeats its input from the second id
/// on and appends the id that follows the input window.
#[must_use]
#[derive(Debug, Clone)]
pub struct LmDataset {
    stream: TokenStream,
    seq_length: usize,
    vocab: Option<Vocabulary>,
}

impl LmDataset {
    /// Wraps an already built stream.
    pub fn new(stream: TokenStream, seq_length: usize) -> Result<Self> {
        if seq_length == 0 {
            return Err(AcceptabilityError::InvalidConfig(
                "seq_length must be greater than zero".into(),
            ));
        }
        Ok(Self {
            stream,
            seq_length,
            vocab: None,
        })
    }

    /// Loads the vocabulary and corpus and builds the stream in one step.
    pub fn from_paths<C, V>(corpus_path: C, vocab_path: V, cfg: &StreamConfig) -> Result<Self>
    where
        C: AsRef<Path>,
        V: AsRef<Path>,
    {
        let vocab = Vocabulary::from_file(vocab_path)?;
        let stream = TokenStream::build(corpus_path, &vocab, cfg)?;
        let mut dataset = Self::new(stream, cfg.seq_length)?;
        dataset.vocab = Some(vocab);
        Ok(dataset)
    }

    /// Number of windows, `(stream_len - 1) / seq_length`.
    ///
    /// A window only counts when its target also fits.  For streams of `k * L + 1` ids with
    /// `L > 1` this is `k`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stream.len().saturating_sub(1) / self.seq_length
    }

    /// Returns `true` when no window fits in the stream.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `(input, target)` pair at `index`.
    pub fn get(&self, index: usize) -> Result<Window<'_>> {
        let len = self.len();
        if index >= len {
            return Err(AcceptabilityError::IndexOutOfRange { index, len });
        }
        Ok(self.window(index))
    }

    /// Iterates over every window in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Window<'_>> + '_ {
        (0..self.len()).map(move |index| self.window(index))
    }

    /// Parallel iterator over every window; the stream is shared read-only across workers.
    pub fn par_windows(&self) -> impl IndexedParallelIterator<Item = Window<'_>> + '_ {
        (0..self.len())
            .into_par_iter()
            .map(move |index| self.window(index))
    }

    /// Window length `L`.
    #[must_use]
    pub fn seq_length(&self) -> usize {
        self.seq_length
    }

    /// Underlying token stream.
    #[must_use]
    pub fn tokens(&self) -> &TokenStream {
        &self.stream
    }

    /// Vocabulary the stream was built with, when loaded through [`LmDataset::from_paths`].
    #[must_use]
    pub fn vocab(&self) -> Option<&Vocabulary> {
        self.vocab.as_ref()
    }

    /// Size of the vocabulary, when known.
    #[must_use]
    pub fn vocab_size(&self) -> Option<usize> {
        self.vocab.as_ref().map(Vocabulary::size)
    }

    fn window(&self, index: usize) -> Window<'_> {
        let tokens = self.stream.as_slice();
        let start = index * self.seq_length;
        let end = start + self.seq_length;
        (&tokens[start..end], &tokens[start + 1..end + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnderfillPolicy;
    use std::fs;
    use tempfile::tempdir;

    fn dataset(len: u32, seq_length: usize) -> LmDataset {
        LmDataset::new(TokenStream::from_ids((0..len).collect()), seq_length).expect("dataset")
    }

    #[test]
    fn length_counts_windows_whose_target_fits() {
        let data = dataset(13, 4);
        assert_eq!(data.len(), 3);
        let data = dataset(12, 4);
        assert_eq!(data.len(), 2);
        let data = dataset(4, 1);
        assert_eq!(data.len(), 3);
        assert!(data.get(3).is_err());
        let data = dataset(1, 4);
        assert!(data.is_empty());
    }

    #[test]
    fn target_is_input_shifted_by_one() {
        let data = dataset(13, 4);
        let tokens = data.tokens().as_slice();
        for index in 0..data.len() {
            let (input, target) = data.get(index).expect("window");
            assert_eq!(input.len(), 4);
            assert_eq!(target.len(), 4);
            assert_eq!(&target[..3], &input[1..]);
            assert_eq!(target[3], tokens[(index + 1) * 4]);
        }
    }

    #[test]
    fn inputs_do_not_overlap() {
        let data = dataset(9, 2);
        let inputs: Vec<&[TokenId]> = data.iter().map(|(input, _)| input).collect();
        assert_eq!(inputs, vec![&[0, 1][..], &[2, 3][..], &[4, 5][..], &[6, 7][..]]);
    }

    #[test]
    fn out_of_range_index_fails() {
        let data = dataset(9, 4);
        let err = data.get(2).expect_err("index out of range");
        assert!(matches!(
            err,
            AcceptabilityError::IndexOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn window_length_one_keeps_targets_in_bounds() {
        let data = dataset(5, 1);
        assert_eq!(data.len(), 4);
        assert_eq!(data.get(3).expect("window"), (&[3][..], &[4][..]));
    }

    #[test]
    fn parallel_windows_match_sequential() {
        let data = dataset(257, 8);
        let sequential: Vec<Window<'_>> = data.iter().collect();
        let parallel: Vec<Window<'_>> = data.par_windows().collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn from_paths_builds_vocab_and_stream() {
        let dir = tempdir().expect("tempdir");
        let corpus = dir.path().join("train.tsv");
        let vocab = dir.path().join("vocab.txt");
        fs::write(&corpus, "a\t1\t\tthe cat sat\nb\t1\t\tthe cat\n").expect("write corpus");
        fs::write(&vocab, "the\ncat\nsat\n").expect("write vocab");

        let cfg = StreamConfig::builder()
            .seq_length(4)
            .underfill(UnderfillPolicy::Error)
            .build()
            .expect("config");
        let data = LmDataset::from_paths(&corpus, &vocab, &cfg).expect("dataset");
        // 9 raw tokens -> 9 ids, two windows
        assert_eq!(data.len(), 2);
        assert_eq!(data.vocab_size(), Some(6));
        let (input, target) = data.get(1).expect("window");
        assert_eq!(input, &[2, 1, 3, 4]);
        assert_eq!(target, &[1, 3, 4, 2]);
    }

    #[test]
    fn zero_seq_length_is_rejected() {
        assert!(LmDataset::new(TokenStream::from_ids(vec![1, 2]), 0).is_err());
    }
}
