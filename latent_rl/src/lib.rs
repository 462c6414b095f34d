//! # latent_rl: Latent World Models and Actor-Critic on Burn
//!
//! Neural network architectures for reinforcement learning in a learned
//! latent space: an observation autoencoder, a transformer belief model that
//! forecasts future latents from a single starting latent, and a
//! squashed-Gaussian actor with a Q critic operating on those latents.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         World model                              │
//! │                                                                  │
//! │  obs ──▶ AutoEncoder::encode ──▶ z ──▶ AutoEncoder::decode ──▶ ô │
//! │                                  │                               │
//! │        actions, rewards,         ▼                               │
//! │        timesteps, masks ──▶ DirectForecastingBelief              │
//! │                                  │  N × TransformerBlock (causal)│
//! │                                  ▼                               │
//! │                          ẑ[0..T] (forecast latents)              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                           Agent                                  │
//! │                                                                  │
//! │  z ──▶ LatentActor ──▶ (action ∈ [low, high], log π)             │
//! │  (z, a) ──▶ LatentCritic ──▶ Q(z, a)                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Training vs. inference
//!
//! Dropout is active on autodiff backends and is the identity otherwise, so
//! `module.valid()` gives a deterministic inference copy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use latent_rl::{AutoEncoderConfig, BeliefConfig, BeliefBatch, ActorConfig};
//!
//! let ae = AutoEncoderConfig::new(obs_dim, 128, 32).init::<B>(&device);
//! let belief = BeliefConfig::new(32, action_dim, horizon, 128).init::<B>(&device);
//! let actor = ActorConfig::new(32, action_dim).with_action_range(-2.0, 2.0).init::<B>(&device);
//!
//! let z = ae.encode(obs);
//! let forecast = belief.forward_batch(BeliefBatch::unpadded(z.clone(), actions, rewards));
//! let sample = actor.get_action(z);
//! ```

pub mod agent;
pub mod checkpoint;
pub mod error;
pub mod grid;
pub mod nn;
pub mod world_model;

pub use error::{LatentRlError, Result};

pub use nn::{
    causal_mask, Mlp, MlpConfig, MultiHeadAttention, MultiHeadAttentionConfig,
    TransformerBlock, TransformerBlockConfig, WeightInit,
};

pub use world_model::{
    forecast_loss, reconstruction_loss, AutoEncoder, AutoEncoderConfig, BeliefBatch,
    BeliefConfig, DirectForecastingBelief,
};

pub use agent::{ActionBounds, ActorConfig, ActorSample, CriticConfig, LatentActor, LatentCritic};

pub use checkpoint::{CheckpointInfo, Checkpointer, CheckpointerConfig};

pub use grid::{apply_overrides, get_configs, ConfigGrid, GridPoint};
