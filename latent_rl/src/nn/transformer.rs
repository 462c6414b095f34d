//! Pre-norm causal transformer block.
//!
//! ```text
//! x ──┬─ LayerNorm ─ causal MHA ─ Dropout ─(+)─┬─ LayerNorm ─ Linear ─ GELU ─ Linear ─ Dropout ─(+)──▶
//!     └──────────────────────────────────────┘ └────────────────────────────────────────────────┘
//! ```
//!
//! The causal mask is built once for `seq_len` and sliced to `[:T, :T]` for
//! every forward call on a sequence of length `T`.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, LayerNorm, Linear};
use burn::prelude::*;
use burn::tensor::activation::gelu;
use burn::tensor::Bool;
use serde::{Deserialize, Serialize};

use super::attention::{causal_mask, MultiHeadAttention, MultiHeadAttentionConfig};
use super::init::WeightInit;

use crate::error::{ensure, Result};

/// Configuration for [`TransformerBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerBlockConfig {
    /// Maximum sequence length (size of the causal mask).
    pub seq_len: usize,
    /// Model width.
    pub hidden_dim: usize,
    /// Attention heads; must divide `hidden_dim`.
    pub num_heads: usize,
    /// Dropout on attention weights.
    pub attention_dropout: f64,
    /// Dropout on both residual branches.
    pub residual_dropout: f64,
    /// Initialization of linear and norm layers.
    pub init: WeightInit,
}

impl TransformerBlockConfig {
    pub fn new(seq_len: usize, hidden_dim: usize, num_heads: usize) -> Self {
        Self {
            seq_len,
            hidden_dim,
            num_heads,
            attention_dropout: 0.1,
            residual_dropout: 0.1,
            init: WeightInit::default(),
        }
    }

    pub fn with_attention_dropout(mut self, p: f64) -> Self {
        self.attention_dropout = p;
        self
    }

    pub fn with_residual_dropout(mut self, p: f64) -> Self {
        self.residual_dropout = p;
        self
    }

    pub fn with_init(mut self, init: WeightInit) -> Self {
        self.init = init;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.seq_len > 0, || "seq_len must be positive".to_string())?;
        ensure(self.num_heads > 0, || "num_heads must be positive".to_string())?;
        ensure(self.hidden_dim % self.num_heads == 0, || {
            format!(
                "hidden_dim ({}) must be divisible by num_heads ({})",
                self.hidden_dim, self.num_heads
            )
        })?;
        for (name, p) in [
            ("attention_dropout", self.attention_dropout),
            ("residual_dropout", self.residual_dropout),
        ] {
            ensure((0.0..1.0).contains(&p), || format!("{} must be in [0, 1), got {}", name, p))?;
        }
        Ok(())
    }

    /// Initialize the block. Panics if the configuration is invalid.
    ///
    /// Layers are initialized in order: norm1, norm2, attention, mlp.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerBlock<B> {
        if let Err(e) = self.validate() {
            panic!("{}", e);
        }
        let d = self.hidden_dim;

        TransformerBlock {
            norm1: self.init.layer_norm(d, device),
            norm2: self.init.layer_norm(d, device),
            drop: DropoutConfig::new(self.residual_dropout).init(),
            attention: MultiHeadAttentionConfig::new(d, self.num_heads)
                .with_dropout(self.attention_dropout)
                .with_output_init(self.init)
                .init(device),
            mlp_in: self.init.linear(d, d, true, device),
            mlp_out: self.init.linear(d, d, true, device),
            mlp_drop: DropoutConfig::new(self.residual_dropout).init(),
            causal_mask: causal_mask(self.seq_len, device),
            seq_len: self.seq_len,
        }
    }
}

/// One causal self-attention + feed-forward layer with pre-normalization.
#[derive(Module, Debug)]
pub struct TransformerBlock<B: Backend> {
    norm1: LayerNorm<B>,
    norm2: LayerNorm<B>,
    drop: Dropout,
    attention: MultiHeadAttention<B>,
    mlp_in: Linear<B>,
    mlp_out: Linear<B>,
    mlp_drop: Dropout,
    /// `true` above the diagonal [seq_len, seq_len]
    causal_mask: Tensor<B, 2, Bool>,
    seq_len: usize,
}

impl<B: Backend> TransformerBlock<B> {
    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - [batch, T, hidden_dim] with T <= seq_len
    /// * `padding_mask` - [batch, T], `true` marks keys excluded from attention
    pub fn forward(&self, x: Tensor<B, 3>, padding_mask: Option<Tensor<B, 2, Bool>>) -> Tensor<B, 3> {
        let [_, t, _] = x.dims();
        assert!(
            t <= self.seq_len,
            "sequence length {} exceeds block capacity {}",
            t,
            self.seq_len
        );
        let causal = self.causal_mask.clone().slice([0..t, 0..t]);

        let h = self.norm1.forward(x.clone());
        let attention_out = self.attention.self_attention(h, Some(causal), padding_mask);
        let x = x + self.drop.forward(attention_out);

        let h = self.norm2.forward(x.clone());
        let h = gelu(self.mlp_in.forward(h));
        let h = self.mlp_drop.forward(self.mlp_out.forward(h));
        x + h
    }

    /// Maximum sequence length supported by the causal mask.
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;

    fn block(seq_len: usize) -> TransformerBlock<TestBackend> {
        TransformerBlockConfig::new(seq_len, 16, 4).init(&Default::default())
    }

    fn to_vec(t: Tensor<TestBackend, 3>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_block_preserves_shape() {
        let device = Default::default();
        let block = block(8);

        let x = Tensor::<TestBackend, 3>::random([3, 8, 16], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(block.forward(x, None).dims(), [3, 8, 16]);
    }

    #[test]
    fn test_shorter_sequence_uses_sliced_mask() {
        let device = Default::default();
        let block = block(10);

        let x = Tensor::<TestBackend, 3>::random([2, 4, 16], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(block.forward(x, None).dims(), [2, 4, 16]);
    }

    #[test]
    fn test_future_positions_do_not_leak() {
        let device = Default::default();
        let block = block(6);

        let x = Tensor::<TestBackend, 3>::random([2, 6, 16], Distribution::Normal(0.0, 1.0), &device);
        let base = block.forward(x.clone(), None);

        // Perturb every position j > i and check output at i, for each i
        for i in 0..5 {
            let noise = Tensor::<TestBackend, 3>::random(
                [2, 5 - i, 16],
                Distribution::Normal(0.0, 10.0),
                &device,
            );
            let perturbed = x.clone().slice_assign(
                [0..2, i + 1..6, 0..16],
                x.clone().slice([0..2, i + 1..6, 0..16]) + noise,
            );
            let out = block.forward(perturbed, None);

            let a = to_vec(base.clone().slice([0..2, 0..i + 1, 0..16]));
            let b = to_vec(out.slice([0..2, 0..i + 1, 0..16]));
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-4, "position <= {} changed: {} vs {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_padding_mask_accepted() {
        let device = Default::default();
        let block = block(4);

        let x = Tensor::<TestBackend, 3>::random([1, 4, 16], Distribution::Normal(0.0, 1.0), &device);
        let padding = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false, false, true, true], [1, 4]),
            &device,
        );

        let out = block.forward(x, Some(padding));
        let values = to_vec(out);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_residual_carries_unnormalized_input() {
        let device = Default::default();
        // Zero weights and biases: both branches contribute nothing
        let block: TransformerBlock<TestBackend> = TransformerBlockConfig::new(4, 16, 4)
            .with_init(WeightInit::new(0.0, 0.0))
            .init(&device);

        // Far from zero mean and unit variance, so a normalized residual would show
        let x = Tensor::<TestBackend, 3>::random([2, 4, 16], Distribution::Normal(3.0, 5.0), &device);
        let out = to_vec(block.forward(x.clone(), None));
        let input = to_vec(x);

        for (y, x) in out.iter().zip(input.iter()) {
            assert!((y - x).abs() < 1e-5, "{} vs {}", y, x);
        }
    }

    #[test]
    fn test_inference_backend_is_deterministic() {
        let device = Default::default();
        let block = block(5);

        let x = Tensor::<TestBackend, 3>::random([2, 5, 16], Distribution::Normal(0.0, 1.0), &device);
        let a = to_vec(block.forward(x.clone(), None));
        let b = to_vec(block.forward(x, None));
        assert_eq!(a, b);
    }

    #[test]
    fn test_dropout_active_on_autodiff_backend() {
        type AdBackend = Autodiff<NdArray<f32>>;
        let device = Default::default();
        let block: TransformerBlock<AdBackend> = TransformerBlockConfig::new(5, 16, 4)
            .with_residual_dropout(0.5)
            .init(&device);

        let x = Tensor::<AdBackend, 3>::random([4, 5, 16], Distribution::Normal(0.0, 1.0), &device);
        let a: Vec<f32> = block.forward(x.clone(), None).into_data().to_vec().unwrap();
        let b: Vec<f32> = block.forward(x, None).into_data().to_vec().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "exceeds block capacity")]
    fn test_rejects_overlong_sequence() {
        let device = Default::default();
        let block = block(3);

        let x = Tensor::<TestBackend, 3>::zeros([1, 4, 16], &device);
        let _ = block.forward(x, None);
    }

    #[test]
    fn test_invalid_head_count() {
        let config = TransformerBlockConfig::new(4, 10, 4);
        assert!(config.validate().is_err());
    }
}
