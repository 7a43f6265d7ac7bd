//! Checkpoint collaborators used by early stopping to persist and restore the best model.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::early_stopping::EarlyStoppingState;
use crate::error::{AcceptabilityError, Result};

/// Capability to save a model handle and later restore it in place.
///
/// Implementations may perform blocking IO and must report failures instead of ignoring them.
pub trait Checkpoint {
    /// Model handle being checkpointed.
    type Model: ?Sized;

    /// Persists the current model as the best one seen so far.
    fn save(&mut self, model: &Self::Model) -> Result<()>;

    /// Overwrites `model` with the last saved state.
    fn restore(&mut self, model: &mut Self::Model) -> Result<()>;

    /// Persists controller state next to the model; ignored unless overridden.
    fn save_state(&mut self, _state: &EarlyStoppingState) -> Result<()> {
        Ok(())
    }

    /// Loads controller state saved by [`Checkpoint::save_state`]; `None` unless overridden.
    fn load_state(&mut self) -> Result<Option<EarlyStoppingState>> {
        Ok(None)
    }
}

/// Keeps the best model as an in-memory clone.
#[derive(Debug, Clone)]
pub struct MemoryCheckpoint<M> {
    best: Option<M>,
    state: Option<EarlyStoppingState>,
    saves: usize,
    restores: usize,
}

impl<M> Default for MemoryCheckpoint<M> {
    fn default() -> Self {
        Self {
            best: None,
            state: None,
            saves: 0,
            restores: 0,
        }
    }
}

impl<M> MemoryCheckpoint<M> {
    /// Creates an empty checkpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved model, if any.
    #[must_use]
    pub fn best(&self) -> Option<&M> {
        self.best.as_ref()
    }

    /// Number of `save` calls so far.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Number of `restore` calls so far.
    #[must_use]
    pub fn restores(&self) -> usize {
        self.restores
    }
}

impl<M: Clone> Checkpoint for MemoryCheckpoint<M> {
    type Model = M;

    fn save(&mut self, model: &M) -> Result<()> {
        self.best = Some(model.clone());
        self.saves += 1;
        Ok(())
    }

    fn restore(&mut self, model: &mut M) -> Result<()> {
        let best = self
            .best
            .as_ref()
            .ok_or_else(|| AcceptabilityError::Checkpoint("no model has been saved".into()))?;
        model.clone_from(best);
        self.restores += 1;
        Ok(())
    }

    fn save_state(&mut self, state: &EarlyStoppingState) -> Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }

    fn load_state(&mut self) -> Result<Option<EarlyStoppingState>> {
        Ok(self.state.clone())
    }
}

/// Stores the model as `<dir>/<name>.json` and controller state as
/// `<dir>/<name>.early_stopping.json`.
#[derive(Debug, Clone)]
pub struct FileCheckpoint<M> {
    dir: PathBuf,
    name: String,
    _model: PhantomData<fn() -> M>,
}

impl<M> FileCheckpoint<M> {
    /// Creates the checkpoint directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P, name: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|err| AcceptabilityError::io(err, Some(dir.clone())))?;
        Ok(Self {
            dir,
            name: name.into(),
            _model: PhantomData,
        })
    }

    /// File holding the serialized model.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.name))
    }

    /// File holding the serialized controller state.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("{}.early_stopping.json", self.name))
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data).map_err(|err| AcceptabilityError::io(err, Some(path.to_path_buf())))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read(path).map_err(|err| AcceptabilityError::io(err, Some(path.to_path_buf())))?;
    Ok(serde_json::from_slice(&data)?)
}

impl<M: Serialize + DeserializeOwned> Checkpoint for FileCheckpoint<M> {
    type Model = M;

    fn save(&mut self, model: &M) -> Result<()> {
        let path = self.model_path();
        write_json(&path, model)?;
        debug!("saved checkpoint to {}", path.display());
        Ok(())
    }

    fn restore(&mut self, model: &mut M) -> Result<()> {
        let path = self.model_path();
        if !path.exists() {
            return Err(AcceptabilityError::Checkpoint(format!(
                "no checkpoint saved at {}",
                path.display()
            )));
        }
        *model = read_json(&path)?;
        info!("restored checkpoint from {}", path.display());
        Ok(())
    }

    fn save_state(&mut self, state: &EarlyStoppingState) -> Result<()> {
        write_json(&self.state_path(), state)
    }

    fn load_state(&mut self) -> Result<Option<EarlyStoppingState>> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}
