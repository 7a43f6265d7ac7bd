//! Metrics describing stream construction and the values tracked by early stopping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Auxiliary metrics recorded next to the monitored value, keyed by name (`acc`, `val_loss`, ...).
pub type MetricMap = BTreeMap<String, f64>;

/// Key of the accuracy entry reported by [`crate::EarlyStopping::print_info`].
pub const ACC: &str = "acc";
/// Key of the validation loss entry reported by [`crate::EarlyStopping::print_info`].
pub const VAL_LOSS: &str = "val_loss";

/// Metric map used before any improvement has been recorded.
#[must_use]
pub fn initial_metrics() -> MetricMap {
    let mut metrics = MetricMap::new();
    metrics.insert(ACC.into(), 0.0);
    metrics.insert(VAL_LOSS.into(), f64::INFINITY);
    metrics
}

/// Statistics captured while building a token stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamMetrics {
    /// Corpus lines read during the counting pass.
    pub lines_read: usize,
    /// Lines skipped for having fewer than four fields.
    pub lines_skipped: usize,
    /// Tokens (including start/end markers) the corpus contains.
    pub raw_tokens: usize,
    /// Pre-computed stream size, `floor(raw / L) * L + 1`.
    pub target_size: usize,
    /// Ids written from the corpus during the fill pass.
    pub written: usize,
    /// Ids appended by the underfill policy.
    pub padded: usize,
    /// Final stream length after the underfill policy ran.
    pub final_size: usize,
}

impl StreamMetrics {
    /// Returns `true` when the corpus could not fill the pre-computed size.
    #[must_use]
    pub fn underfilled(&self) -> bool {
        self.written < self.target_size
    }
}

/// Serde helpers storing `f64` values in JSON, where non-finite numbers are written as the
/// strings `"inf"`, `"-inf"` and `"NaN"`.
pub mod json_float {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum JsonFloat {
        Number(f64),
        Text(String),
    }

    impl From<f64> for JsonFloat {
        fn from(value: f64) -> Self {
            if value.is_finite() {
                Self::Number(value)
            } else {
                Self::Text(value.to_string())
            }
        }
    }

    impl JsonFloat {
        fn value<E: serde::de::Error>(self) -> Result<f64, E> {
            match self {
                Self::Number(value) => Ok(value),
                Self::Text(text) => text
                    .parse::<f64>()
                    .map_err(|_| E::custom(format!("invalid float {text:?}"))),
            }
        }
    }

    /// Serializes a single float.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        JsonFloat::from(*value).serialize(serializer)
    }

    /// Deserializes a single float.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        JsonFloat::deserialize(deserializer)?.value()
    }

    /// Helpers for maps of named floats.
    pub mod map {
        use super::*;

        /// Serializes every value of the map.
        pub fn serialize<S: Serializer>(
            values: &BTreeMap<String, f64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            values
                .iter()
                .map(|(name, value)| (name, JsonFloat::from(*value)))
                .collect::<BTreeMap<_, _>>()
                .serialize(serializer)
        }

        /// Deserializes every value of the map.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, f64>, D::Error> {
            BTreeMap::<String, JsonFloat>::deserialize(deserializer)?
                .into_iter()
                .map(|(name, value)| value.value::<D::Error>().map(|value| (name, value)))
                .collect()
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_metrics_hold_neutral_values() {
        let metrics = initial_metrics();
        assert_eq!(metrics[ACC], 0.0);
        assert!(metrics[VAL_LOSS].is_infinite());
    }

    #[test]
    fn underfilled_compares_written_to_target() {
        let metrics = StreamMetrics {
            target_size: 6,
            written: 5,
            ..StreamMetrics::default()
        };
        assert!(metrics.underfilled());
    }
}
