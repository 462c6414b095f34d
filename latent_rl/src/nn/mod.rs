//! Neural network building blocks shared by the world model and the agent.
//!
//! # Modules
//!
//! - [`init`]: Per-layer weight initialization rules
//! - [`mlp`]: ReLU multilayer perceptron
//! - [`attention`]: Multi-head attention with causal and padding masks
//! - [`transformer`]: Pre-norm causal transformer block

pub mod attention;
pub mod init;
pub mod mlp;
pub mod transformer;

pub use attention::{causal_mask, MultiHeadAttention, MultiHeadAttentionConfig, MASKED_SCORE};
pub use init::{Fill, LayerKind, ParamRole, WeightInit, INIT_STD, LAYER_NORM_EPS};
pub use mlp::{Mlp, MlpConfig};
pub use transformer::{TransformerBlock, TransformerBlockConfig};
