//! Latent world model: observation autoencoder and belief forecaster.
//!
//! ```text
//! observation ─ AutoEncoder::encode ─▶ z
//! (z, actions, rewards, timesteps, masks) ─ DirectForecastingBelief ─▶ ẑ[0..T]
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use latent_rl::world_model::{AutoEncoderConfig, BeliefConfig, BeliefBatch};
//!
//! let ae = AutoEncoderConfig::new(obs_dim, 128, 32).init::<B>(&device);
//! let belief = BeliefConfig::new(32, action_dim, 16, 128)
//!     .with_num_layers(4)
//!     .init::<B>(&device);
//!
//! let z = ae.encode(obs);
//! let forecast = belief.forward_batch(BeliefBatch::unpadded(z, actions, rewards));
//! ```

mod autoencoder;
mod belief;
mod loss;

pub use autoencoder::{AutoEncoder, AutoEncoderConfig};
pub use belief::{BeliefBatch, BeliefConfig, DirectForecastingBelief};
pub use loss::{forecast_loss, reconstruction_loss};

#[cfg(test)]
mod tests;
