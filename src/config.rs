//! Configuration builders controlling stream construction, early stopping, and acceptability
//! preprocessing.

use serde::{Deserialize, Serialize};

use crate::error::{AcceptabilityError, Result};

/// How the stream builder resolves a corpus that ends before the pre-sized buffer is full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnderfillPolicy {
    /// Fill the remaining slots with the end-of-sentence id.
    #[default]
    PadWithEnd,
    /// Fail with [`AcceptabilityError::UnderfilledStream`].
    Error,
    /// Shrink the stream to the largest `k * seq_length + 1` ids that were written.
    Truncate,
}

/// Configuration for building a language-model token stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    /// Window length `L` of every training example.
    pub seq_length: usize,
    /// Resolution applied when the corpus cannot fill the stream.
    pub underfill: UnderfillPolicy,
}

impl StreamConfig {
    /// Returns a builder initialised with [`StreamConfig::default`].
    #[must_use]
    pub fn builder() -> StreamBuilder {
        StreamBuilder::default()
    }

    /// Validates the invariants required for stream construction.
    pub fn validate(&self) -> Result<()> {
        if self.seq_length == 0 {
            return Err(AcceptabilityError::InvalidConfig(
                "seq_length must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            seq_length: 32,
            underfill: UnderfillPolicy::default(),
        }
    }
}

/// Builder for [`StreamConfig`].
#[derive(Debug, Default, Clone)]
pub struct StreamBuilder {
    cfg: StreamConfig,
}

impl StreamBuilder {
    /// Sets the window length.
    #[must_use]
    pub fn seq_length(mut self, value: usize) -> Self {
        self.cfg.seq_length = value;
        self
    }

    /// Sets the underfill policy.
    #[must_use]
    pub fn underfill(mut self, policy: UnderfillPolicy) -> Self {
        self.cfg.underfill = policy;
        self
    }

    /// Finalises the builder, returning a validated [`StreamConfig`].
    pub fn build(self) -> Result<StreamConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration for the early-stopping controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EarlyStoppingConfig {
    /// Epochs tolerated without improvement before stopping.
    pub patience: usize,
    /// Treat lower values of the monitored metric as better.
    pub minimize: bool,
}

impl EarlyStoppingConfig {
    /// Returns a builder initialised with [`EarlyStoppingConfig::default`].
    #[must_use]
    pub fn builder() -> EarlyStoppingBuilder {
        EarlyStoppingBuilder::default()
    }
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self {
            patience: 20,
            minimize: false,
        }
    }
}

/// Builder for [`EarlyStoppingConfig`].
#[derive(Debug, Default, Clone)]
pub struct EarlyStoppingBuilder {
    cfg: EarlyStoppingConfig,
}

impl EarlyStoppingBuilder {
    /// Sets the patience in epochs.
    #[must_use]
    pub fn patience(mut self, value: usize) -> Self {
        self.cfg.patience = value;
        self
    }

    /// Monitors a metric that should decrease (e.g. validation loss).
    #[must_use]
    pub fn minimize(mut self, enabled: bool) -> Self {
        self.cfg.minimize = enabled;
        self
    }

    /// Finalises the builder.
    pub fn build(self) -> EarlyStoppingConfig {
        self.cfg
    }
}

/// Preprocessing applied to acceptability sentences before they reach a classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcceptabilityConfig {
    /// Lowercases every token.
    pub lowercase: bool,
    /// Number of tokens each sentence is cropped or padded to.
    pub crop_pad_length: usize,
    /// Token used to pad short sentences.
    pub pad_token: String,
}

impl AcceptabilityConfig {
    /// Returns a builder initialised with [`AcceptabilityConfig::default`].
    #[must_use]
    pub fn builder() -> AcceptabilityBuilder {
        AcceptabilityBuilder::default()
    }

    /// Validates the preprocessing settings.
    pub fn validate(&self) -> Result<()> {
        if self.crop_pad_length == 0 {
            return Err(AcceptabilityError::InvalidConfig(
                "crop_pad_length must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AcceptabilityConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            crop_pad_length: 30,
            pad_token: "<pad>".into(),
        }
    }
}

/// Builder for [`AcceptabilityConfig`].
#[derive(Debug, Default, Clone)]
pub struct AcceptabilityBuilder {
    cfg: AcceptabilityConfig,
}

impl AcceptabilityBuilder {
    /// Enables or disables lowercasing.
    #[must_use]
    pub fn lowercase(mut self, enabled: bool) -> Self {
        self.cfg.lowercase = enabled;
        self
    }

    /// Sets the fixed sentence length.
    #[must_use]
    pub fn crop_pad_length(mut self, value: usize) -> Self {
        self.cfg.crop_pad_length = value;
        self
    }

    /// Overrides the padding token.
    #[must_use]
    pub fn pad_token(mut self, token: impl Into<String>) -> Self {
        self.cfg.pad_token = token.into();
        self
    }

    /// Finalises the builder, returning a validated [`AcceptabilityConfig`].
    pub fn build(self) -> Result<AcceptabilityConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_builder_rejects_zero_seq_length() {
        let err = StreamConfig::builder()
            .seq_length(0)
            .build()
            .expect_err("validation should fail");
        assert!(matches!(
            err,
            AcceptabilityError::InvalidConfig(message) if message.contains("seq_length")
        ));
    }

    #[test]
    fn stream_builder_overrides_defaults() {
        let cfg = StreamConfig::builder()
            .seq_length(4)
            .underfill(UnderfillPolicy::Truncate)
            .build()
            .expect("config should be valid");
        assert_eq!(cfg.seq_length, 4);
        assert_eq!(cfg.underfill, UnderfillPolicy::Truncate);
    }

    #[test]
    fn early_stopping_defaults_maximise() {
        let cfg = EarlyStoppingConfig::default();
        assert_eq!(cfg.patience, 20);
        assert!(!cfg.minimize);
        let cfg = EarlyStoppingConfig::builder().patience(3).minimize(true).build();
        assert_eq!(cfg.patience, 3);
        assert!(cfg.minimize);
    }

    #[test]
    fn underfill_policy_serialises_snake_case() {
        let json = serde_json::to_string(&UnderfillPolicy::PadWithEnd).expect("serialize");
        assert_eq!(json, "\"pad_with_end\"");
    }

    #[test]
    fn acceptability_builder_rejects_zero_length() {
        assert!(AcceptabilityConfig::builder()
            .crop_pad_length(0)
            .build()
            .is_err());
    }
}
