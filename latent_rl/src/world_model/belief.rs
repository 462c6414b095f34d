//! Direct forecasting belief model.
//!
//! A causal transformer that predicts a sequence of latent states from one
//! starting latent, conditioned on per-step actions, rewards and timesteps.
//!
//! # Architecture
//!
//! ```text
//! latent [B, L] ──repeat T──────────────┐
//! actions [B, T, C] ─ condition_layer ──┼─ concat [B, T, 3L] ─ hidden_emb ─(+)─ norm ─ dropout
//! rewards [B, T, 1] ─ reward_layer ─────┘                                  │
//! timesteps [T] ─ repeat B ─ timestep_emb ─────────────────────────────────┘
//!     ─ TransformerBlock × num_layers (causal + padding mask) ─ out_norm ─ out_layer ─▶ [B, T, L]
//! ```
//!
//! Every position receives the same starting latent: a single belief
//! conditions the whole rollout.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Embedding, LayerNorm, Linear};
use burn::prelude::*;
use burn::tensor::{Bool, Int};
use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};
use crate::nn::{TransformerBlock, TransformerBlockConfig, WeightInit};

/// Configuration for [`DirectForecastingBelief`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefConfig {
    /// Width of the latent vectors consumed and predicted.
    pub latent_dim: usize,
    /// Width of the per-step condition (action) vectors.
    pub condition_dim: usize,
    /// Maximum horizon; also the size of the timestep embedding table.
    pub seq_len: usize,
    /// Transformer width.
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub num_heads: usize,
    pub attention_dropout: f64,
    pub residual_dropout: f64,
    /// Dropout applied after the input embedding.
    pub hidden_dropout: f64,
    pub init: WeightInit,
}

impl BeliefConfig {
    /// Create a configuration with 10 layers, 4 heads and 0.1 dropout.
    pub fn new(latent_dim: usize, condition_dim: usize, seq_len: usize, hidden_dim: usize) -> Self {
        Self {
            latent_dim,
            condition_dim,
            seq_len,
            hidden_dim,
            num_layers: 10,
            num_heads: 4,
            attention_dropout: 0.1,
            residual_dropout: 0.1,
            hidden_dropout: 0.1,
            init: WeightInit::default(),
        }
    }

    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn with_num_heads(mut self, num_heads: usize) -> Self {
        self.num_heads = num_heads;
        self
    }

    pub fn with_attention_dropout(mut self, p: f64) -> Self {
        self.attention_dropout = p;
        self
    }

    pub fn with_residual_dropout(mut self, p: f64) -> Self {
        self.residual_dropout = p;
        self
    }

    pub fn with_hidden_dropout(mut self, p: f64) -> Self {
        self.hidden_dropout = p;
        self
    }

    /// Set all three dropout rates at once.
    pub fn with_dropout(self, p: f64) -> Self {
        self.with_attention_dropout(p)
            .with_residual_dropout(p)
            .with_hidden_dropout(p)
    }

    pub fn with_init(mut self, init: WeightInit) -> Self {
        self.init = init;
        self
    }

    fn block_config(&self) -> TransformerBlockConfig {
        TransformerBlockConfig::new(self.seq_len, self.hidden_dim, self.num_heads)
            .with_attention_dropout(self.attention_dropout)
            .with_residual_dropout(self.residual_dropout)
            .with_init(self.init)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            self.latent_dim > 0 && self.condition_dim > 0 && self.hidden_dim > 0,
            || format!(
                "belief dims must be positive (latent {}, condition {}, hidden {})",
                self.latent_dim, self.condition_dim, self.hidden_dim
            ),
        )?;
        ensure((0.0..1.0).contains(&self.hidden_dropout), || {
            format!("hidden_dropout must be in [0, 1), got {}", self.hidden_dropout)
        })?;
        self.block_config().validate()
    }

    /// Initialize, reporting an invalid configuration as an error.
    ///
    /// Every layer is initialized explicitly in declaration order through
    /// [`WeightInit`]: linear and embedding weights ~ Normal(0, 0.02), biases
    /// zero, norms identity.
    pub fn try_init<B: Backend>(&self, device: &B::Device) -> Result<DirectForecastingBelief<B>> {
        self.validate()?;
        let init = &self.init;
        let block_config = self.block_config();

        let model = DirectForecastingBelief {
            condition_layer: init.linear(self.condition_dim, self.latent_dim, false, device),
            reward_layer: init.linear(1, self.latent_dim, false, device),
            hidden_emb: init.linear(3 * self.latent_dim, self.hidden_dim, false, device),
            timestep_emb: init.embedding(self.seq_len, self.hidden_dim, device),
            hidden_drop: DropoutConfig::new(self.hidden_dropout).init(),
            hidden_norm: init.layer_norm(self.hidden_dim, device),
            out_norm: init.layer_norm(self.hidden_dim, device),
            blocks: (0..self.num_layers)
                .map(|_| block_config.init(device))
                .collect(),
            out_layer: init.linear(self.hidden_dim, self.latent_dim, false, device),
            latent_dim: self.latent_dim,
            condition_dim: self.condition_dim,
            seq_len: self.seq_len,
        };

        log::debug!(
            "belief model: {} layers, {} heads, hidden {}, horizon {}: {} params",
            self.num_layers,
            self.num_heads,
            self.hidden_dim,
            self.seq_len,
            model.num_params()
        );
        Ok(model)
    }

    /// Initialize. Panics if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DirectForecastingBelief<B> {
        self.try_init(device).unwrap_or_else(|e| panic!("{}", e))
    }
}

/// One batch of belief-model inputs.
#[derive(Debug, Clone)]
pub struct BeliefBatch<B: Backend> {
    /// Starting latent per element [batch, latent_dim]
    pub latents: Tensor<B, 2>,
    /// Condition vectors [batch, T, condition_dim]
    pub actions: Tensor<B, 3>,
    /// Rewards [batch, T, 1]
    pub rewards: Tensor<B, 3>,
    /// Position indices in [0, seq_len), shared by the batch [T]
    pub timesteps: Tensor<B, 1, Int>,
    /// Padding flags [batch, T], `true` = padded
    pub masks: Option<Tensor<B, 2, Bool>>,
}

impl<B: Backend> BeliefBatch<B> {
    /// Batch with timesteps `0..T` and no padding.
    pub fn unpadded(latents: Tensor<B, 2>, actions: Tensor<B, 3>, rewards: Tensor<B, 3>) -> Self {
        let device = actions.device();
        let [_, t, _] = actions.dims();
        Self {
            latents,
            actions,
            rewards,
            timesteps: Tensor::arange(0..t as i64, &device),
            masks: None,
        }
    }

    /// Attach a padding mask.
    pub fn with_masks(mut self, masks: Tensor<B, 2, Bool>) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Sequence length T.
    pub fn horizon(&self) -> usize {
        self.actions.dims()[1]
    }
}

/// Causal transformer forecasting latent sequences.
#[derive(Module, Debug)]
pub struct DirectForecastingBelief<B: Backend> {
    condition_layer: Linear<B>,
    reward_layer: Linear<B>,
    hidden_emb: Linear<B>,
    timestep_emb: Embedding<B>,
    hidden_drop: Dropout,
    hidden_norm: LayerNorm<B>,
    out_norm: LayerNorm<B>,
    blocks: Vec<TransformerBlock<B>>,
    out_layer: Linear<B>,
    latent_dim: usize,
    condition_dim: usize,
    seq_len: usize,
}

impl<B: Backend> DirectForecastingBelief<B> {
    /// Predict one latent per timestep.
    ///
    /// # Arguments
    /// * `latents` - [batch, latent_dim], repeated over the horizon
    /// * `actions` - [batch, T, condition_dim]
    /// * `rewards` - [batch, T, 1]
    /// * `timesteps` - [T] indices into the timestep embedding
    /// * `masks` - [batch, T] padding flags, `true` = padded
    ///
    /// # Returns
    /// Predicted latents [batch, T, latent_dim]
    pub fn forward(
        &self,
        latents: Tensor<B, 2>,
        actions: Tensor<B, 3>,
        rewards: Tensor<B, 3>,
        timesteps: Tensor<B, 1, Int>,
        masks: Option<Tensor<B, 2, Bool>>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len, _] = actions.dims();

        let latents = latents.unsqueeze_dim::<3>(1).repeat_dim(1, seq_len);
        let timesteps = timesteps.unsqueeze_dim::<2>(0).repeat_dim(0, batch_size);
        let actions_emb = self.condition_layer.forward(actions);
        let rewards_emb = self.reward_layer.forward(rewards);
        let concat_latents = Tensor::cat(vec![latents, actions_emb, rewards_emb], 2);

        let time_emb = self.timestep_emb.forward(timesteps);

        let z = self.hidden_emb.forward(concat_latents) + time_emb;
        let z = self.hidden_norm.forward(z);
        let z = self.hidden_drop.forward(z);

        let z = self
            .blocks
            .iter()
            .fold(z, |z, block| block.forward(z, masks.clone()));

        let z = self.out_norm.forward(z);
        self.out_layer.forward(z)
    }

    /// [`forward`](Self::forward) on a [`BeliefBatch`].
    pub fn forward_batch(&self, batch: BeliefBatch<B>) -> Tensor<B, 3> {
        self.forward(
            batch.latents,
            batch.actions,
            batch.rewards,
            batch.timesteps,
            batch.masks,
        )
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub fn condition_dim(&self) -> usize {
        self.condition_dim
    }

    /// Maximum forecast horizon.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn num_layers(&self) -> usize {
        self.blocks.len()
    }
}
