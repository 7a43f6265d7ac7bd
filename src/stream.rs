//! Two-pass construction of the flat token stream consumed by language-model datasets.

use std::path::Path;

use log::{debug, info, warn};

use crate::config::{StreamConfig, UnderfillPolicy};
use crate::corpus::for_each_record;
use crate::error::{AcceptabilityError, Result};
use crate::metrics::StreamMetrics;
use crate::special_tokens::{wrap_sentence, EOS_INDEX, UNK_INDEX};
use crate::vocab::{TokenId, Vocabulary};

/// Flat sequence of token ids built from every sentence of a corpus.
#[must_use]
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<TokenId>,
    metrics: StreamMetrics,
}

impl TokenStream {
    /// Tokenizes the corpus at `corpus_path` into a stream of `floor(n / L) * L + 1` ids.
    ///
    /// The corpus is read twice: once to count tokens (sentence words plus the start and end
    /// markers) and once to write ids into a buffer allocated up front.  Reading stops as soon
    /// as the buffer is full.  If the corpus ends first, [`StreamConfig::underfill`] decides the
    /// outcome.
    pub fn build<P: AsRef<Path>>(
        corpus_path: P,
        vocab: &Vocabulary,
        cfg: &StreamConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        let corpus_path = corpus_path.as_ref();
        let seq_length = cfg.seq_length;

        let mut raw_tokens = 0usize;
        let scan = for_each_record(corpus_path, |record| {
            raw_tokens += record.words().count() + 2;
            true
        })?;
        let target_size = (raw_tokens / seq_length) * seq_length + 1;
        debug!(
            "counted {} tokens over {} lines ({} skipped); target stream size {}",
            raw_tokens, scan.lines, scan.skipped, target_size
        );

        let mut buffer: Vec<TokenId> = vec![UNK_INDEX; target_size];
        let mut cursor = 0usize;
        for_each_record(corpus_path, |record| {
            for word in wrap_sentence(record.words()) {
                buffer[cursor] = vocab.index_of(word);
                cursor += 1;
                if cursor == target_size {
                    return false;
                }
            }
            true
        })?;

        let mut metrics = StreamMetrics {
            lines_read: scan.lines,
            lines_skipped: scan.skipped,
            raw_tokens,
            target_size,
            written: cursor,
            padded: 0,
            final_size: target_size,
        };

        if cursor < target_size {
            match cfg.underfill {
                UnderfillPolicy::PadWithEnd => {
                    buffer[cursor..].fill(EOS_INDEX);
                    metrics.padded = target_size - cursor;
                    warn!(
                        "corpus {} produced {} of {} ids; padded {} with end-of-sentence",
                        corpus_path.display(),
                        cursor,
                        target_size,
                        metrics.padded
                    );
                }
                UnderfillPolicy::Error => {
                    return Err(AcceptabilityError::UnderfilledStream {
                        expected: target_size,
                        written: cursor,
                    });
                }
                UnderfillPolicy::Truncate => {
                    let kept = if cursor == 0 {
                        0
                    } else {
                        ((cursor - 1) / seq_length) * seq_length + 1
                    };
                    buffer.truncate(kept);
                    metrics.final_size = kept;
                    warn!(
                        "corpus {} produced {} of {} ids; truncated stream to {}",
                        corpus_path.display(),
                        cursor,
                        target_size,
                        kept
                    );
                }
            }
        }

        info!(
            "built token stream of {} ids from {} (seq_length {})",
            buffer.len(),
            corpus_path.display(),
            seq_length
        );
        Ok(Self {
            tokens: buffer,
            metrics,
        })
    }

    /// Wraps ids that were produced elsewhere.
    pub fn from_ids(tokens: Vec<TokenId>) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            metrics: StreamMetrics {
                target_size: len,
                written: len,
                final_size: len,
                ..StreamMetrics::default()
            },
        }
    }

    /// Returns the ids in stream order.
    #[must_use]
    pub fn as_slice(&self) -> &[TokenId] {
        &self.tokens
    }

    /// Number of ids in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` when the stream holds no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Statistics captured while the stream was built.
    #[must_use]
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }
}
