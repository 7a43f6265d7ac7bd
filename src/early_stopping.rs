//! Metric-driven early stopping.
//!
//! [`EarlyStopping::evaluate`] is called once per epoch with the monitored validation metric.
//! A strict improvement saves the model through the [`Checkpoint`]; once more than `patience`
//! epochs have passed since the best epoch, the best model is restored and the caller is told
//! to stop.

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;
use crate::config::EarlyStoppingConfig;
use crate::error::Result;
use crate::metrics::{initial_metrics, json_float, MetricMap, ACC, VAL_LOSS};

/// Best values observed so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarlyStoppingState {
    /// Best value of the monitored metric.
    #[serde(with = "json_float")]
    pub best_monitored_metric: f64,
    /// Epoch at which [`EarlyStoppingState::best_monitored_metric`] was recorded.
    pub best_monitored_epoch: usize,
    /// Metrics reported alongside the best monitored value.
    #[serde(with = "json_float::map")]
    pub other_metrics: MetricMap,
}

impl EarlyStoppingState {
    /// Starting state: `0` when maximising, `+inf` when minimising.
    #[must_use]
    pub fn new(minimize: bool) -> Self {
        Self {
            best_monitored_metric: if minimize { f64::INFINITY } else { 0.0 },
            best_monitored_epoch: 0,
            other_metrics: initial_metrics(),
        }
    }
}

/// Read-only report of the best epoch.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EarlyStoppingSummary {
    /// Best value of the monitored metric.
    pub best_monitored_metric: f64,
    /// Accuracy recorded at the best epoch.
    pub best_accuracy: f64,
    /// Validation loss recorded at the best epoch.
    pub best_loss: f64,
    /// Epoch of the best value.
    pub best_monitored_epoch: usize,
}

impl fmt::Display for EarlyStoppingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Best metric: {:.5}, Best Accuracy: {:.5}, Best Loss: {:.9} at epoch {}",
            self.best_monitored_metric,
            self.best_accuracy,
            self.best_loss,
            self.best_monitored_epoch
        )
    }
}

/// Early-stopping controller over a [`Checkpoint`] collaborator.
///
/// Calls must come from a single training loop with strictly increasing epochs.
#[derive(Debug)]
pub struct EarlyStopping<C> {
    cfg: EarlyStoppingConfig,
    state: EarlyStoppingState,
    checkpoint: C,
}

impl<C: Checkpoint> EarlyStopping<C> {
    /// Creates a controller with a fresh [`EarlyStoppingState`].
    pub fn new(checkpoint: C, cfg: EarlyStoppingConfig) -> Self {
        Self {
            state: EarlyStoppingState::new(cfg.minimize),
            cfg,
            checkpoint,
        }
    }

    /// Records the metrics of `epoch` and returns `true` when training must stop.
    ///
    /// Equal values do not count as an improvement.  When patience is exhausted the model is
    /// restored to the last saved state before returning.
    pub fn evaluate(
        &mut self,
        model: &mut C::Model,
        value: f64,
        other_metrics: MetricMap,
        epoch: usize,
    ) -> Result<bool> {
        let improved = if self.cfg.minimize {
            value < self.state.best_monitored_metric
        } else {
            value > self.state.best_monitored_metric
        };

        if improved {
            debug!(
                "epoch {epoch}: monitored metric improved {:.5} -> {value:.5}",
                self.state.best_monitored_metric
            );
            self.state.best_monitored_metric = value;
            self.state.other_metrics = other_metrics;
            self.state.best_monitored_epoch = epoch;
            self.checkpoint.save(model)?;
            self.checkpoint.save_state(&self.state)?;
            return Ok(false);
        }

        if self
            .state
            .best_monitored_epoch
            .saturating_add(self.cfg.patience)
            < epoch
        {
            info!(
                "epoch {epoch}: no improvement since epoch {} (patience {}); restoring best model",
                self.state.best_monitored_epoch, self.cfg.patience
            );
            self.checkpoint.restore(model)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Resumes from state persisted by the checkpoint, returning `true` if any was found.
    ///
    /// Checkpoints that do not persist controller state leave the controller untouched.
    pub fn init_from_checkpoint(&mut self) -> Result<bool> {
        match self.checkpoint.load_state()? {
            Some(state) => {
                info!(
                    "resuming early stopping from epoch {} (best {:.5})",
                    state.best_monitored_epoch, state.best_monitored_metric
                );
                self.state = state;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<C> EarlyStopping<C> {
    /// Current best values.
    #[must_use]
    pub fn state(&self) -> &EarlyStoppingState {
        &self.state
    }

    /// Configuration the controller runs with.
    #[must_use]
    pub fn config(&self) -> &EarlyStoppingConfig {
        &self.cfg
    }

    /// Best monitored value.
    #[must_use]
    pub fn best_monitored_metric(&self) -> f64 {
        self.state.best_monitored_metric
    }

    /// Epoch of the best monitored value.
    #[must_use]
    pub fn best_monitored_epoch(&self) -> usize {
        self.state.best_monitored_epoch
    }

    /// Metrics recorded with the best monitored value.
    #[must_use]
    pub fn other_metrics(&self) -> &MetricMap {
        &self.state.other_metrics
    }

    /// Report of the best epoch; missing `acc`/`val_loss` entries read as `0` and `+inf`.
    #[must_use]
    pub fn summary(&self) -> EarlyStoppingSummary {
        let metrics = &self.state.other_metrics;
        EarlyStoppingSummary {
            best_monitored_metric: self.state.best_monitored_metric,
            best_accuracy: metrics.get(ACC).copied().unwrap_or(0.0),
            best_loss: metrics.get(VAL_LOSS).copied().unwrap_or(f64::INFINITY),
            best_monitored_epoch: self.state.best_monitored_epoch,
        }
    }

    /// Logs [`EarlyStopping::summary`] at info level.
    pub fn print_info(&self) {
        info!("{}", self.summary());
    }

    /// Shared access to the checkpoint collaborator.
    #[must_use]
    pub fn checkpoint(&self) -> &C {
        &self.checkpoint
    }

    /// Consumes the controller, returning the checkpoint.
    pub fn into_checkpoint(self) -> C {
        self.checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{FileCheckpoint, MemoryCheckpoint};
    use tempfile::tempdir;

    fn metrics(acc: f64, val_loss: f64) -> MetricMap {
        let mut map = MetricMap::new();
        map.insert(ACC.into(), acc);
        map.insert(VAL_LOSS.into(), val_loss);
        map
    }

    fn controller(patience: usize, minimize: bool) -> EarlyStopping<MemoryCheckpoint<u32>> {
        let cfg = EarlyStoppingConfig::builder()
            .patience(patience)
            .minimize(minimize)
            .build();
        EarlyStopping::new(MemoryCheckpoint::new(), cfg)
    }

    #[test]
    fn plateau_stops_after_patience_and_restores_once() {
        let mut stopper = controller(1, false);
        let mut model = 0u32;
        let mut decisions = Vec::new();
        for (epoch, value) in [(1usize, 0.1), (2, 0.5), (3, 0.5), (4, 0.5)] {
            model += 10;
            decisions.push(
                stopper
                    .evaluate(&mut model, value, metrics(0.7, 0.3), epoch)
                    .expect("evaluate"),
            );
        }
        assert_eq!(decisions, vec![false, false, false, true]);
        assert_eq!(stopper.best_monitored_epoch(), 2);
        assert_eq!(stopper.checkpoint().saves(), 2);
        assert_eq!(stopper.checkpoint().restores(), 1);
        assert_eq!(model, 20, "model restored to the epoch 2 weights");
    }

    #[test]
    fn strictly_improving_metric_never_stops() {
        let mut stopper = controller(0, false);
        let mut model = 0u32;
        for epoch in 1..=10usize {
            let stop = stopper
                .evaluate(&mut model, epoch as f64 / 10.0, MetricMap::new(), epoch)
                .expect("evaluate");
            assert!(!stop);
        }
        assert_eq!(stopper.checkpoint().saves(), 10);
        assert_eq!(stopper.checkpoint().restores(), 0);
    }

    #[test]
    fn minimising_tracks_lower_values() {
        let mut stopper = controller(2, true);
        let mut model = 0u32;
        assert!(!stopper
            .evaluate(&mut model, 1.5, metrics(0.5, 1.5), 1)
            .expect("evaluate"));
        assert!(!stopper
            .evaluate(&mut model, 1.2, metrics(0.6, 1.2), 2)
            .expect("evaluate"));
        assert!(!stopper
            .evaluate(&mut model, 1.3, metrics(0.6, 1.3), 3)
            .expect("evaluate"));
        assert!(!stopper
            .evaluate(&mut model, 1.2, metrics(0.6, 1.2), 4)
            .expect("evaluate"));
        assert!(stopper
            .evaluate(&mut model, 1.4, metrics(0.6, 1.4), 5)
            .expect("evaluate"));
        assert_eq!(stopper.best_monitored_metric(), 1.2);
        assert_eq!(stopper.best_monitored_epoch(), 2);
    }

    #[test]
    fn non_positive_metric_never_saves_when_maximising() {
        let mut stopper = controller(1, false);
        let mut model = 0u32;
        assert!(!stopper
            .evaluate(&mut model, 0.0, MetricMap::new(), 1)
            .expect("evaluate"));
        assert!(stopper.evaluate(&mut model, -0.2, MetricMap::new(), 2).is_err());
    }

    #[test]
    fn summary_reports_best_epoch_metrics() {
        let mut stopper = controller(5, false);
        let initial = stopper.summary();
        assert_eq!(initial.best_accuracy, 0.0);
        assert!(initial.best_loss.is_infinite());

        let mut model = 0u32;
        stopper
            .evaluate(&mut model, 0.42, metrics(0.81, 0.35), 3)
            .expect("evaluate");
        let summary = stopper.summary();
        assert_eq!(summary.best_monitored_metric, 0.42);
        assert_eq!(summary.best_accuracy, 0.81);
        assert_eq!(summary.best_loss, 0.35);
        assert_eq!(summary.best_monitored_epoch, 3);
        assert_eq!(
            summary.to_string(),
            "Best metric: 0.42000, Best Accuracy: 0.81000, Best Loss: 0.350000000 at epoch 3"
        );
    }

    #[test]
    fn init_from_checkpoint_resumes_saved_state() {
        let dir = tempdir().expect("tempdir");
        let cfg = EarlyStoppingConfig::builder().patience(2).build();
        let mut model = vec![0.5f32, 0.25];

        let checkpoint =
            FileCheckpoint::<Vec<f32>>::new(dir.path(), "classifier").expect("checkpoint");
        let mut stopper = EarlyStopping::new(checkpoint, cfg.clone());
        assert!(!stopper.init_from_checkpoint().expect("nothing to resume"));
        stopper
            .evaluate(&mut model, 0.6, metrics(0.9, 0.2), 4)
            .expect("evaluate");

        let checkpoint = FileCheckpoint::<Vec<f32>>::new(dir.path(), "classifier").expect("reopen");
        let mut resumed = EarlyStopping::new(checkpoint, cfg);
        assert!(resumed.init_from_checkpoint().expect("resume"));
        assert_eq!(resumed.state(), stopper.state());

        let mut other = vec![9.0f32];
        assert!(resumed
            .evaluate(&mut other, 0.1, MetricMap::new(), 7)
            .expect("evaluate"));
        assert_eq!(other, model);
    }
}
