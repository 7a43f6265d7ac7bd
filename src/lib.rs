//! Corpus pipeline for sentence acceptability and language modeling, plus metric-driven
//! early stopping.
//!
//! The language-model path reads a closed vocabulary, flattens a tab-separated corpus into one
//! token stream of `floor(n / L) * L + 1` ids, and serves fixed-length `(input, target)` windows
//! where the target is the input shifted by one id.
//!
//! ```no_run
//! use acceptability::{LmDataset, StreamConfig};
//!
//! # fn main() -> acceptability::Result<()> {
//! let cfg = StreamConfig::builder().seq_length(35).build()?;
//! let dataset = LmDataset::from_paths("data/train.tsv", "data/vocab.txt", &cfg)?;
//! for (input, target) in dataset.iter() {
//!     assert_eq!(&input[1..], &target[..input.len() - 1]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Training loops report each epoch's validation metric to [`EarlyStopping`], which saves the
//! best model through a [`Checkpoint`] and restores it once patience runs out.
//!
//! The `lmdata` command line tool is enabled by default through the `cli` feature; disable
//! default features to depend on the library alone.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod acceptability;
pub mod checkpoint;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod early_stopping;
pub mod error;
pub mod metrics;
pub mod special_tokens;
pub mod stream;
pub mod vocab;

pub use acceptability::{AcceptabilityDataset, AcceptabilityExample};
pub use checkpoint::{Checkpoint, FileCheckpoint, MemoryCheckpoint};
pub use config::{AcceptabilityConfig, EarlyStoppingConfig, StreamConfig, UnderfillPolicy};
pub use dataset::{LmDataset, Window};
pub use early_stopping::{EarlyStopping, EarlyStoppingState, EarlyStoppingSummary};
pub use error::{AcceptabilityError, Result};
pub use metrics::{MetricMap, StreamMetrics};
pub use stream::TokenStream;
pub use vocab::{TokenId, TokenIndex, Vocabulary};
