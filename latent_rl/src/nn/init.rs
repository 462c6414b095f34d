//! Explicit parameter initialization keyed on layer kind.
//!
//! The belief model initializes every layer it owns through [`WeightInit`]
//! at construction time, in declaration order. Which distribution a tensor
//! gets is decided by a `(LayerKind, ParamRole)` pair:
//!
//! | kind        | weight              | bias  |
//! |-------------|---------------------|-------|
//! | `Linear`    | Normal(mean, std)   | zeros |
//! | `Embedding` | Normal(mean, std)   | -     |
//! | `Norm`      | ones                | zeros |
//!
//! # Usage
//!
//! ```ignore
//! use latent_rl::nn::WeightInit;
//!
//! let init = WeightInit::default(); // Normal(0, 0.02)
//! let proj: Linear<B> = init.linear(64, 128, false, &device);
//! let pos: Embedding<B> = init.embedding(32, 128, &device);
//! let norm: LayerNorm<B> = init.layer_norm(128, &device);
//! ```

use burn::module::Param;
use burn::nn::{Embedding, LayerNorm, LayerNormConfig, Linear};
use burn::prelude::*;
use burn::tensor::Distribution;
use serde::{Deserialize, Serialize};

/// Default standard deviation for linear and embedding weights.
pub const INIT_STD: f64 = 0.02;

/// Epsilon added to the variance in layer normalization.
pub const LAYER_NORM_EPS: f64 = 1e-5;

/// Kind of layer a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Linear,
    Embedding,
    Norm,
}

/// Role of a parameter inside its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Weight,
    Bias,
}

/// How a parameter tensor is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Normal { mean: f64, std: f64 },
    Ones,
    Zeros,
}

/// Normal(mean, std) weight initialization with zero biases and identity norms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightInit {
    pub mean: f64,
    pub std: f64,
}

impl Default for WeightInit {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: INIT_STD,
        }
    }
}

impl WeightInit {
    /// Create an initializer with the given weight distribution.
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Fill rule for one parameter of one layer kind.
    pub fn fill(&self, kind: LayerKind, role: ParamRole) -> Fill {
        match (kind, role) {
            (LayerKind::Linear | LayerKind::Embedding, ParamRole::Weight) => Fill::Normal {
                mean: self.mean,
                std: self.std,
            },
            (LayerKind::Norm, ParamRole::Weight) => Fill::Ones,
            (_, ParamRole::Bias) => Fill::Zeros,
        }
    }

    /// Materialize a tensor for the given layer kind and parameter role.
    pub fn tensor<B: Backend, const D: usize>(
        &self,
        kind: LayerKind,
        role: ParamRole,
        shape: [usize; D],
        device: &B::Device,
    ) -> Tensor<B, D> {
        match self.fill(kind, role) {
            Fill::Normal { mean, std } => {
                Tensor::random(shape, Distribution::Normal(mean, std), device)
            }
            Fill::Ones => Tensor::ones(shape, device),
            Fill::Zeros => Tensor::zeros(shape, device),
        }
    }

    /// Linear layer `d_input -> d_output`.
    ///
    /// Burn stores linear weights as `[d_input, d_output]`.
    pub fn linear<B: Backend>(
        &self,
        d_input: usize,
        d_output: usize,
        bias: bool,
        device: &B::Device,
    ) -> Linear<B> {
        let weight = self.tensor(LayerKind::Linear, ParamRole::Weight, [d_input, d_output], device);
        let bias = bias.then(|| {
            Param::from_tensor(self.tensor(LayerKind::Linear, ParamRole::Bias, [d_output], device))
        });

        Linear {
            weight: Param::from_tensor(weight),
            bias,
        }
    }

    /// Embedding table of `n_embedding` rows of width `d_model`.
    pub fn embedding<B: Backend>(
        &self,
        n_embedding: usize,
        d_model: usize,
        device: &B::Device,
    ) -> Embedding<B> {
        let weight = self.tensor(
            LayerKind::Embedding,
            ParamRole::Weight,
            [n_embedding, d_model],
            device,
        );
        Embedding {
            weight: Param::from_tensor(weight),
        }
    }

    /// Layer normalization over the last dimension of width `d_model`.
    ///
    /// Burn's layer norm already starts at the `Norm` fill (scale one,
    /// shift zero), so only the epsilon is set here.
    pub fn layer_norm<B: Backend>(&self, d_model: usize, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(d_model)
            .with_epsilon(LAYER_NORM_EPS)
            .init(device)
    }
}
