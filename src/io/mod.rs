//! Configuration I/O - loading and saving configurations and checkpoints
//!
//! Dicts are written in their tagged form, as JSON or YAML chosen from the
//! file extension.

mod checkpoint;
mod format;
mod load;
mod save;

#[cfg(test)]
mod tests;

pub use checkpoint::{Checkpoint, CONFIG_FILE, WEIGHTS_FILE};
pub use format::ConfigFormat;
pub use load::{load_config, load_dict};
pub use save::{save_config, save_dict};
