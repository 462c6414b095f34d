//! Latent-space actor with a squashed Gaussian policy.
//!
//! ```text
//! z ─ Linear(latent→256) ─ ReLU ─ Linear(256→256) ─ ReLU ─┬─ mean_head ──────────────▶ mean
//!                                                          └─ log_std_head ─ tanh ─ remap ─▶ log_std
//! ```
//!
//! Actions are `tanh(mean + std · ε) · scale + bias`, clamped to
//! `[low, high]` so f32 rounding of the affine map cannot leave the bounds.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::tanh;
use serde::{Deserialize, Serialize};

use super::squashed_gaussian::{
    rsample, squash_log_std, squashed_log_prob, ActionBounds, LOG_STD_MAX, LOG_STD_MIN,
};
use crate::error::{ensure, Result};
use crate::nn::{Mlp, MlpConfig};

/// Default trunk width for actor and critic.
pub const HIDDEN_WIDTH: usize = 256;

/// Configuration for [`LatentActor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub latent_dim: usize,
    pub bounds: ActionBounds,
    pub log_std_min: f32,
    pub log_std_max: f32,
    pub hidden_dim: usize,
}

impl ActorConfig {
    /// Actor over `[-1, 1]^action_dim` with log-std in `[-5, 2]`.
    pub fn new(latent_dim: usize, action_dim: usize) -> Self {
        Self {
            latent_dim,
            bounds: ActionBounds::unit(action_dim),
            log_std_min: LOG_STD_MIN,
            log_std_max: LOG_STD_MAX,
            hidden_dim: HIDDEN_WIDTH,
        }
    }

    /// Same `[low, high]` on every action dimension.
    pub fn with_action_range(mut self, low: f32, high: f32) -> Self {
        self.bounds = ActionBounds::uniform(self.bounds.action_dim(), low, high);
        self
    }

    /// Per-dimension bounds; also sets the action dimension.
    pub fn with_bounds(mut self, bounds: ActionBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_log_std_range(mut self, min: f32, max: f32) -> Self {
        self.log_std_min = min;
        self.log_std_max = max;
        self
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn action_dim(&self) -> usize {
        self.bounds.action_dim()
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.latent_dim > 0 && self.hidden_dim > 0, || {
            format!(
                "actor dims must be positive (latent {}, hidden {})",
                self.latent_dim, self.hidden_dim
            )
        })?;
        ensure(self.log_std_min < self.log_std_max, || {
            format!(
                "log_std_min ({}) must be below log_std_max ({})",
                self.log_std_min, self.log_std_max
            )
        })?;
        self.bounds.validate()
    }

    /// Initialize, reporting an invalid configuration as an error.
    pub fn try_init<B: Backend>(&self, device: &B::Device) -> Result<LatentActor<B>> {
        self.validate()?;
        let action_dim = self.action_dim();

        let actor = LatentActor {
            trunk: MlpConfig::new(&[self.latent_dim, self.hidden_dim, self.hidden_dim])
                .with_activate_output(true)
                .init(device),
            mean_head: LinearConfig::new(self.hidden_dim, action_dim).init(device),
            log_std_head: LinearConfig::new(self.hidden_dim, action_dim).init(device),
            action_scale: self.bounds.scale(),
            action_bias: self.bounds.bias(),
            action_low: self.bounds.low.clone(),
            action_high: self.bounds.high.clone(),
            log_std_min: self.log_std_min,
            log_std_max: self.log_std_max,
        };

        log::debug!(
            "actor {} -> {} -> {} actions: {} params",
            self.latent_dim,
            self.hidden_dim,
            action_dim,
            actor.num_params()
        );
        Ok(actor)
    }

    /// Initialize. Panics if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LatentActor<B> {
        self.try_init(device).unwrap_or_else(|e| panic!("{}", e))
    }
}

/// Output of [`LatentActor::get_action`].
#[derive(Debug, Clone)]
pub struct ActorSample<B: Backend> {
    /// Sampled action within bounds [batch, action_dim]
    pub action: Tensor<B, 2>,
    /// Log probability of `action` [batch, 1]
    pub log_prob: Tensor<B, 2>,
    /// `tanh(mean)` mapped to the bounds [batch, action_dim]
    pub mean_action: Tensor<B, 2>,
}

/// Stochastic policy over a bounded continuous action space.
#[derive(Module, Debug)]
pub struct LatentActor<B: Backend> {
    trunk: Mlp<B>,
    mean_head: Linear<B>,
    log_std_head: Linear<B>,
    /// (high - low) / 2, fixed
    action_scale: Vec<f32>,
    /// (high + low) / 2, fixed
    action_bias: Vec<f32>,
    action_low: Vec<f32>,
    action_high: Vec<f32>,
    log_std_min: f32,
    log_std_max: f32,
}

impl<B: Backend> LatentActor<B> {
    /// Returns `(mean, log_std)`, both [batch, action_dim].
    pub fn forward(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let features = self.trunk.forward(x);

        let mean = self.mean_head.forward(features.clone());
        let raw_log_std = self.log_std_head.forward(features);
        let log_std = squash_log_std(raw_log_std, self.log_std_min, self.log_std_max);

        (mean, log_std)
    }

    /// Returns `(mean, std)`.
    pub fn get_mean_std(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let (mean, log_std) = self.forward(x);
        (mean, log_std.exp())
    }

    /// Sample an action with the reparameterization trick.
    pub fn get_action(&self, x: Tensor<B, 2>) -> ActorSample<B> {
        let (mean, log_std) = self.forward(x);
        let scale = self.scale_tensor(&mean.device());

        let x_t = rsample(mean.clone(), log_std.clone().exp());
        let action = self.to_bounds(tanh(x_t.clone()));
        // Density of the unclamped squash; the clamp only absorbs rounding
        let log_prob = squashed_log_prob(x_t, mean.clone(), log_std, scale);
        let mean_action = self.to_bounds(tanh(mean));

        ActorSample {
            action,
            log_prob,
            mean_action,
        }
    }

    /// `tanh(mean)` mapped to the bounds, without sampling.
    pub fn deterministic_action(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let (mean, _) = self.forward(x);
        self.to_bounds(tanh(mean))
    }

    pub fn action_dim(&self) -> usize {
        self.action_scale.len()
    }

    /// Log-std bounds `(min, max)`.
    pub fn log_std_bounds(&self) -> (f32, f32) {
        (self.log_std_min, self.log_std_max)
    }

    /// Map `squashed` in [-1, 1] onto `[low, high]` per dimension.
    fn to_bounds(&self, squashed: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = squashed.device();
        let dims = squashed.dims();

        let action = squashed * self.scale_tensor(&device) + row(&self.action_bias, &device);
        action
            .max_pair(row(&self.action_low, &device).expand(dims))
            .min_pair(row(&self.action_high, &device).expand(dims))
    }

    /// [1, action_dim]
    fn scale_tensor(&self, device: &B::Device) -> Tensor<B, 2> {
        row(&self.action_scale, device)
    }
}

/// [1, len]
fn row<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_floats(values, device).unsqueeze()
}
