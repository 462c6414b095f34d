//! Plain multi-layer perceptron.
//!
//! An ordered list of linear layers with ReLU between them. Whether the last
//! layer is also followed by ReLU is fixed at construction.
//!
//! ```text
//! MlpConfig::new(&[4, 256, 256, 1])
//!   Linear(4→256) → ReLU → Linear(256→256) → ReLU → Linear(256→1)
//! ```

use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};

/// Configuration for [`Mlp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Layer widths, input first. `n` widths build `n - 1` linear layers.
    pub widths: Vec<usize>,
    /// Whether the linear layers carry a bias.
    pub bias: bool,
    /// Apply ReLU after the final layer too.
    pub activate_output: bool,
}

impl MlpConfig {
    /// Create a configuration from layer widths (input first).
    pub fn new(widths: &[usize]) -> Self {
        Self {
            widths: widths.to_vec(),
            bias: true,
            activate_output: false,
        }
    }

    /// Set whether the linear layers carry a bias.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set whether ReLU follows the final layer.
    pub fn with_activate_output(mut self, activate_output: bool) -> Self {
        self.activate_output = activate_output;
        self
    }

    /// Check that the widths describe at least one non-empty layer.
    pub fn validate(&self) -> Result<()> {
        ensure(self.widths.len() >= 2, || {
            format!("mlp needs at least 2 widths, got {:?}", self.widths)
        })?;
        ensure(self.widths.iter().all(|&w| w > 0), || {
            format!("mlp widths must be non-zero, got {:?}", self.widths)
        })
    }

    /// Initialize with Burn's default linear initialization.
    ///
    /// Panics if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        if let Err(e) = self.validate() {
            panic!("{}", e);
        }

        let layers = self
            .widths
            .windows(2)
            .map(|pair| {
                LinearConfig::new(pair[0], pair[1])
                    .with_bias(self.bias)
                    .init(device)
            })
            .collect();

        Mlp {
            layers,
            activation: Relu::new(),
            activate_output: self.activate_output,
        }
    }
}

/// Linear layers applied in order, ReLU in between.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    layers: Vec<Linear<B>>,
    activation: Relu,
    activate_output: bool,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass over the last dimension of `x`.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let last = self.layers.len() - 1;

        self.layers.iter().enumerate().fold(x, |x, (i, layer)| {
            let x = layer.forward(x);
            if i < last || self.activate_output {
                self.activation.forward(x)
            } else {
                x
            }
        })
    }

    /// Number of linear layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Input width of the first layer.
    pub fn d_input(&self) -> usize {
        self.layers[0].weight.val().dims()[0]
    }

    /// Output width of the last layer.
    pub fn d_output(&self) -> usize {
        self.layers[self.layers.len() - 1].weight.val().dims()[1]
    }
}
