//! Masked multi-head attention.
//!
//! Two boolean masks can be applied, both with `true` meaning "this key is
//! hidden from this query":
//!
//! - `attn_mask` [seq_q, seq_k], shared by every sequence in the batch
//!   (the causal mask from [`causal_mask`] is the usual one)
//! - `key_padding_mask` [batch, seq_k], marking padded positions per sequence
//!
//! # Usage
//!
//! ```ignore
//! use latent_rl::nn::{causal_mask, MultiHeadAttentionConfig};
//!
//! let attention = MultiHeadAttentionConfig::new(64, 4)
//!     .with_dropout(0.1)
//!     .init::<B>(&device);
//!
//! let mask = causal_mask::<B>(seq_len, &device);
//! let y = attention.self_attention(x, Some(mask), Some(padding));
//! ```

use burn::module::{Module, Param};
use burn::nn::attention::generate_autoregressive_mask;
use burn::nn::{Dropout, DropoutConfig, Linear};
use burn::prelude::*;
use burn::tensor::activation::softmax;
use burn::tensor::{Bool, Distribution};

use super::init::WeightInit;

/// Score assigned to masked keys before the softmax.
///
/// Finite so that a query whose keys are all masked yields a uniform row
/// instead of NaN; any unmasked key dominates it completely in f32.
pub const MASKED_SCORE: f32 = -1.0e9;

/// Configuration for [`MultiHeadAttention`].
#[derive(Debug, Clone)]
pub struct MultiHeadAttentionConfig {
    pub d_model: usize,
    pub n_heads: usize,
    /// Dropout on the attention weights
    pub dropout: f64,
    /// Initialization of the output projection
    pub output_init: WeightInit,
}

impl MultiHeadAttentionConfig {
    /// Panics unless `d_model` splits evenly into `n_heads` heads.
    pub fn new(d_model: usize, n_heads: usize) -> Self {
        assert!(
            n_heads > 0 && d_model % n_heads == 0,
            "d_model ({}) must be divisible by n_heads ({})",
            d_model,
            n_heads
        );
        Self {
            d_model,
            n_heads,
            dropout: 0.0,
            output_init: WeightInit::default(),
        }
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_output_init(mut self, init: WeightInit) -> Self {
        self.output_init = init;
        self
    }

    /// Query, key and value projections are initialized as one fused
    /// `d -> 3d` map: Xavier-uniform over fan `d + 3d`. The output projection
    /// follows `output_init`. Biases start at zero.
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        let d = self.d_model;
        let bound = (6.0 / (4 * d) as f64).sqrt();

        let input_projection = || Linear {
            weight: Param::from_tensor(Tensor::random(
                [d, d],
                Distribution::Uniform(-bound, bound),
                device,
            )),
            bias: Some(Param::from_tensor(Tensor::zeros([d], device))),
        };

        MultiHeadAttention {
            query: input_projection(),
            key: input_projection(),
            value: input_projection(),
            output: self.output_init.linear(d, d, true, device),
            dropout: DropoutConfig::new(self.dropout).init(),
            n_heads: self.n_heads,
            d_head: d / self.n_heads,
        }
    }
}

/// Scaled dot-product attention over `n_heads` parallel heads.
///
/// ```text
/// head_i(Q, K, V) = dropout(softmax(mask(Q_i K_iᵀ / √d_head))) V_i
/// output          = concat(head_1 .. head_h) W_o
/// ```
#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    query: Linear<B>,
    key: Linear<B>,
    value: Linear<B>,
    output: Linear<B>,
    dropout: Dropout,
    n_heads: usize,
    d_head: usize,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// # Arguments
    /// * `query` - [batch, seq_q, d_model]
    /// * `key`, `value` - [batch, seq_k, d_model]
    /// * `attn_mask` - Optional [seq_q, seq_k], shared by the batch
    /// * `key_padding_mask` - Optional [batch, seq_k]
    ///
    /// # Returns
    /// [batch, seq_q, d_model]
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key: Tensor<B, 3>,
        value: Tensor<B, 3>,
        attn_mask: Option<Tensor<B, 2, Bool>>,
        key_padding_mask: Option<Tensor<B, 2, Bool>>,
    ) -> Tensor<B, 3> {
        let [batch, seq_q, _] = query.dims();
        let seq_k = key.dims()[1];

        let q = self.split_heads(self.query.forward(query));
        let k = self.split_heads(self.key.forward(key));
        let v = self.split_heads(self.value.forward(value));

        // [batch, heads, seq_q, seq_k]
        let mut scores = q
            .matmul(k.swap_dims(2, 3))
            .div_scalar((self.d_head as f32).sqrt());

        if let Some(mask) = combine_masks(attn_mask, key_padding_mask, [batch, seq_q, seq_k]) {
            let mask = mask
                .unsqueeze_dim::<4>(1)
                .expand([batch, self.n_heads, seq_q, seq_k]);
            scores = scores.mask_fill(mask, MASKED_SCORE);
        }

        let weights = self.dropout.forward(softmax(scores, 3));
        self.output.forward(self.merge_heads(weights.matmul(v)))
    }

    /// Attention of `x` over itself.
    pub fn self_attention(
        &self,
        x: Tensor<B, 3>,
        attn_mask: Option<Tensor<B, 2, Bool>>,
        key_padding_mask: Option<Tensor<B, 2, Bool>>,
    ) -> Tensor<B, 3> {
        self.forward(x.clone(), x.clone(), x, attn_mask, key_padding_mask)
    }

    pub fn d_model(&self) -> usize {
        self.n_heads * self.d_head
    }

    pub fn n_heads(&self) -> usize {
        self.n_heads
    }

    /// [batch, seq, d_model] -> [batch, heads, seq, d_head]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, seq, _] = x.dims();
        x.reshape([batch, seq, self.n_heads, self.d_head])
            .swap_dims(1, 2)
    }

    /// [batch, heads, seq, d_head] -> [batch, seq, d_model]
    fn merge_heads(&self, x: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch, _, seq, _] = x.dims();
        x.swap_dims(1, 2)
            .reshape([batch, seq, self.n_heads * self.d_head])
    }
}

/// Broadcast both masks to [batch, seq_q, seq_k] and OR them.
fn combine_masks<B: Backend>(
    attn_mask: Option<Tensor<B, 2, Bool>>,
    key_padding_mask: Option<Tensor<B, 2, Bool>>,
    shape: [usize; 3],
) -> Option<Tensor<B, 3, Bool>> {
    let shared = attn_mask.map(|m| m.unsqueeze_dim::<3>(0).expand(shape));
    let padding = key_padding_mask.map(|m| m.unsqueeze_dim::<3>(1).expand(shape));

    match (shared, padding) {
        (Some(a), Some(p)) => Some(a.bool_or(p)),
        (a, p) => a.or(p),
    }
}

/// [seq_len, seq_len] mask that is `true` above the diagonal (key j > query i).
pub fn causal_mask<B: Backend>(seq_len: usize, device: &B::Device) -> Tensor<B, 2, Bool> {
    generate_autoregressive_mask::<B>(1, seq_len, device).reshape([seq_len, seq_len])
}
