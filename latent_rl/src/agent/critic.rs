//! Latent-space Q critic.
//!
//! ```text
//! concat(z, a) ─ Linear(latent+action→256) ─ ReLU ─ Linear(256→256) ─ ReLU ─ Linear(256→1) ─▶ Q(z, a)
//! ```

use burn::module::Module;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use super::actor::HIDDEN_WIDTH;
use crate::error::{ensure, Result};
use crate::nn::{Mlp, MlpConfig};

/// Configuration for [`LatentCritic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticConfig {
    pub latent_dim: usize,
    pub action_dim: usize,
    pub hidden_dim: usize,
}

impl CriticConfig {
    pub fn new(latent_dim: usize, action_dim: usize) -> Self {
        Self {
            latent_dim,
            action_dim,
            hidden_dim: HIDDEN_WIDTH,
        }
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            self.latent_dim > 0 && self.action_dim > 0 && self.hidden_dim > 0,
            || format!("critic dims must be positive, got {:?}", self),
        )
    }

    /// Initialize, reporting an invalid configuration as an error.
    pub fn try_init<B: Backend>(&self, device: &B::Device) -> Result<LatentCritic<B>> {
        self.validate()?;

        let critic = LatentCritic {
            q: MlpConfig::new(&[
                self.latent_dim + self.action_dim,
                self.hidden_dim,
                self.hidden_dim,
                1,
            ])
            .init(device),
            latent_dim: self.latent_dim,
            action_dim: self.action_dim,
        };

        log::debug!(
            "critic ({} + {}) -> {}: {} params",
            self.latent_dim,
            self.action_dim,
            self.hidden_dim,
            critic.num_params()
        );
        Ok(critic)
    }

    /// Initialize. Panics if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LatentCritic<B> {
        self.try_init(device).unwrap_or_else(|e| panic!("{}", e))
    }
}

/// Scalar action-value estimate Q(z, a).
#[derive(Module, Debug)]
pub struct LatentCritic<B: Backend> {
    q: Mlp<B>,
    latent_dim: usize,
    action_dim: usize,
}

impl<B: Backend> LatentCritic<B> {
    /// # Arguments
    /// * `x` - Latent states [batch, latent_dim]
    /// * `a` - Actions [batch, action_dim]
    ///
    /// # Returns
    /// Q-values [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>, a: Tensor<B, 2>) -> Tensor<B, 2> {
        self.q.forward(Tensor::cat(vec![x, a], 1))
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }
}
