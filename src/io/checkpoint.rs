//! Checkpoints: a configuration plus the state of the object built from it

use super::load::load_dict;
use super::save::save_config;
use crate::error::{Error, Result};
use crate::lazy::{Kwargs, Parsable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Configuration file inside a checkpoint directory
pub const CONFIG_FILE: &str = "config.yaml";

/// State file inside a checkpoint directory
pub const WEIGHTS_FILE: &str = "weights.json";

/// A constructed object whose state can be saved next to its configuration
pub trait Checkpoint: Parsable {
    type State: Serialize + DeserializeOwned;

    fn state_dict(&self) -> Self::State;

    fn load_state_dict(&mut self, state: Self::State) -> Result<()>;

    /// Write `config.yaml` and `weights.json` into `dir`, creating it if needed
    fn to_checkpoint(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        save_config(dir.join(CONFIG_FILE), self.config())?;

        let weights = serde_json::to_string(&self.state_dict())
            .map_err(|e| Error::Serialization(format!("state serialization failed: {e}")))?;
        std::fs::write(dir.join(WEIGHTS_FILE), weights)?;

        info!(dir = %dir.display(), class = Self::PATH, "saved checkpoint");
        Ok(())
    }

    /// Rebuild from the configuration in `dir`, then restore its state
    fn from_checkpoint(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_checkpoint_with(dir, Kwargs::new())
    }

    /// Like [`from_checkpoint`](Checkpoint::from_checkpoint), passing
    /// `overrides` to the constructor
    fn from_checkpoint_with(dir: impl AsRef<Path>, overrides: Kwargs) -> Result<Self> {
        let dir = dir.as_ref();
        let config = <Self as Parsable>::from_dict(&load_dict(dir.join(CONFIG_FILE))?)?;
        let mut object: Self = config.to_eager_with(overrides)?;

        let weights = std::fs::read_to_string(dir.join(WEIGHTS_FILE))?;
        let state = serde_json::from_str(&weights)
            .map_err(|e| Error::Serialization(format!("state deserialization failed: {e}")))?;
        object.load_state_dict(state)?;

        info!(dir = %dir.display(), class = Self::PATH, "loaded checkpoint");
        Ok(object)
    }
}
