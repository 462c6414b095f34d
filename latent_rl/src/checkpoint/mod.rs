//! Model checkpointing.
//!
//! ## Features
//!
//! - Checkpoint saving at configurable step intervals
//! - Best model tracking based on a metric (e.g., forecast loss negated)
//! - Cleanup of old checkpoints
//! - JSON config files stored next to the weights
//!
//! ## Example
//!
//! ```rust,ignore
//! use latent_rl::checkpoint::{Checkpointer, CheckpointerConfig};
//!
//! let config = CheckpointerConfig::new("./checkpoints")
//!     .with_save_interval(1_000)
//!     .with_keep_last_n(3);
//!
//! let mut checkpointer = Checkpointer::new(config)?;
//! checkpointer.save_config("belief.json", &belief_config)?;
//!
//! if checkpointer.should_save(step) {
//!     checkpointer.save::<B, _>(&belief, step, Some(-loss))?;
//! }
//!
//! let (belief, step) = checkpointer.load_latest::<B, _>(belief_config.init(&device), &device)?;
//! ```

mod checkpointer;

pub use checkpointer::{CheckpointInfo, Checkpointer, CheckpointerConfig};
