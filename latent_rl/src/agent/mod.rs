//! Latent-space actor-critic.
//!
//! The actor and critic are separate networks that both consume the latent
//! produced by the world model's encoder:
//!
//! ```text
//! Actor
//! ├── trunk: MLP (latent → 256 → 256)
//! ├── mean_head → mean [batch, action_dim]
//! └── log_std_head → tanh → remap → log_std [batch, action_dim]
//!
//! Critic
//! └── MLP(concat(latent, action)) → Q [batch, 1]
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use latent_rl::agent::{ActorConfig, CriticConfig};
//!
//! let actor = ActorConfig::new(32, 2).with_action_range(-2.0, 2.0).init::<B>(&device);
//! let critic = CriticConfig::new(32, 2).init::<B>(&device);
//!
//! let sample = actor.get_action(z.clone());
//! let q = critic.forward(z, sample.action);
//! ```

mod actor;
mod critic;
mod squashed_gaussian;

pub use actor::{ActorConfig, ActorSample, LatentActor, HIDDEN_WIDTH};
pub use critic::{CriticConfig, LatentCritic};
pub use squashed_gaussian::{
    gaussian_log_prob, rsample, squash_log_std, squashed_log_prob, ActionBounds, LOG_STD_MAX,
    LOG_STD_MIN, SQUASH_EPSILON,
};
