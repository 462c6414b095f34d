//! Squashed Gaussian policy math.
//!
//! A diagonal Gaussian sample `x ~ N(μ, σ)` is squashed by `tanh` and
//! rescaled to the action bounds:
//!
//! ```text
//! y = tanh(x)
//! a = y · scale + bias,   scale = (high - low) / 2,   bias = (high + low) / 2
//! ```
//!
//! # Log Probability Correction
//!
//! ```text
//! log π(a|s) = Σ_i [ log N(x_i; μ_i, σ_i) - log(scale_i · (1 - y_i²) + ε) ]
//! ```
//!
//! with `ε = 1e-6` guarding against `log(0)` when `|y| → 1`.

use burn::prelude::*;
use burn::tensor::activation::tanh;
use burn::tensor::Distribution;
use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};

/// Guard added inside the tanh log-det correction.
pub const SQUASH_EPSILON: f32 = 1e-6;

/// Default log standard deviation bounds.
pub const LOG_STD_MIN: f32 = -5.0;
pub const LOG_STD_MAX: f32 = 2.0;

/// Per-dimension action bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBounds {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl ActionBounds {
    /// Bounds given per dimension.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        Self { low, high }
    }

    /// Same `[low, high]` interval on every dimension.
    pub fn uniform(action_dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; action_dim],
            high: vec![high; action_dim],
        }
    }

    /// `[-1, 1]` on every dimension.
    pub fn unit(action_dim: usize) -> Self {
        Self::uniform(action_dim, -1.0, 1.0)
    }

    pub fn action_dim(&self) -> usize {
        self.low.len()
    }

    /// `(high - low) / 2` per dimension.
    pub fn scale(&self) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(l, h)| (h - l) / 2.0)
            .collect()
    }

    /// `(high + low) / 2` per dimension.
    pub fn bias(&self) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(l, h)| (h + l) / 2.0)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.low.len() == self.high.len(), || {
            format!(
                "action bounds differ in length: low {} vs high {}",
                self.low.len(),
                self.high.len()
            )
        })?;
        ensure(!self.low.is_empty(), || "action bounds are empty".to_string())?;
        for (i, (l, h)) in self.low.iter().zip(&self.high).enumerate() {
            ensure(l.is_finite() && h.is_finite() && l <= h, || {
                format!("invalid bounds on dimension {}: [{}, {}]", i, l, h)
            })?;
        }
        Ok(())
    }
}

/// Map a raw head output into `[log_std_min, log_std_max]`.
///
/// ```text
/// log_std = log_std_min + 0.5 · (log_std_max - log_std_min) · (tanh(raw) + 1)
/// ```
pub fn squash_log_std<B: Backend>(
    raw_log_std: Tensor<B, 2>,
    log_std_min: f32,
    log_std_max: f32,
) -> Tensor<B, 2> {
    tanh(raw_log_std)
        .add_scalar(1.0)
        .mul_scalar(0.5 * (log_std_max - log_std_min))
        .add_scalar(log_std_min)
}

/// Reparameterized sample `mean + std · ε`, `ε ~ N(0, 1)`.
///
/// Gradients flow to `mean` and `std`.
pub fn rsample<B: Backend>(mean: Tensor<B, 2>, std: Tensor<B, 2>) -> Tensor<B, 2> {
    let noise = Tensor::random(mean.dims(), Distribution::Normal(0.0, 1.0), &mean.device());
    mean + std * noise
}

/// Per-dimension Gaussian log density `log N(x; mean, exp(log_std))`.
pub fn gaussian_log_prob<B: Backend>(
    x: Tensor<B, 2>,
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let log_sqrt_2pi = 0.5 * (2.0 * std::f32::consts::PI).ln();
    let var = log_std.clone().mul_scalar(2.0).exp();

    (x - mean).powf_scalar(2.0).div(var.mul_scalar(2.0)).neg() - log_std - log_sqrt_2pi
}

/// Log probability of a squashed sample, summed over action dimensions.
///
/// # Arguments
/// * `pre_squash` - Gaussian sample `x` [batch, action_dim]
/// * `mean`, `log_std` - Gaussian parameters [batch, action_dim]
/// * `action_scale` - [1, action_dim] or [batch, action_dim]
///
/// # Returns
/// Log probabilities [batch, 1]
pub fn squashed_log_prob<B: Backend>(
    pre_squash: Tensor<B, 2>,
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
    action_scale: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let squashed = tanh(pre_squash.clone());
    let log_prob = gaussian_log_prob(pre_squash, mean, log_std);

    let one_minus_y2 = squashed.powf_scalar(2.0).neg().add_scalar(1.0);
    let correction = (action_scale * one_minus_y2).add_scalar(SQUASH_EPSILON).log();

    (log_prob - correction).sum_dim(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    fn values(t: Tensor<B, 2>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_bounds_scale_and_bias() {
        let bounds = ActionBounds::new(vec![-2.0, 0.0], vec![2.0, 1.0]);

        assert_eq!(bounds.scale(), vec![2.0, 0.5]);
        assert_eq!(bounds.bias(), vec![0.0, 0.5]);
        assert_eq!(bounds.action_dim(), 2);
        assert!(bounds.validate().is_ok());
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(ActionBounds::new(vec![1.0], vec![-1.0]).validate().is_err());
        assert!(ActionBounds::new(vec![-1.0, -1.0], vec![1.0]).validate().is_err());
        assert!(ActionBounds::new(vec![], vec![]).validate().is_err());
        assert!(ActionBounds::uniform(2, f32::NEG_INFINITY, 1.0).validate().is_err());
    }

    #[test]
    fn test_squash_log_std_range() {
        let device = Default::default();
        let raw: Tensor<B, 2> = Tensor::from_floats([[-1e6, -10.0, 0.0, 10.0, 1e6]], &device);
        let log_std = values(squash_log_std(raw, LOG_STD_MIN, LOG_STD_MAX));

        assert!(log_std.iter().all(|&v| (LOG_STD_MIN..=LOG_STD_MAX).contains(&v)));
        assert!((log_std[0] - LOG_STD_MIN).abs() < 1e-5);
        assert!((log_std[2] - (LOG_STD_MIN + LOG_STD_MAX) / 2.0).abs() < 1e-5);
        assert!((log_std[4] - LOG_STD_MAX).abs() < 1e-5);
    }

    #[test]
    fn test_gaussian_log_prob_standard_normal() {
        let device = Default::default();
        let x: Tensor<B, 2> = Tensor::from_floats([[0.0, 1.0]], &device);
        let lp = values(gaussian_log_prob(
            x,
            Tensor::zeros([1, 2], &device),
            Tensor::zeros([1, 2], &device),
        ));

        let log_sqrt_2pi = 0.5 * (2.0 * std::f32::consts::PI).ln();
        assert!((lp[0] + log_sqrt_2pi).abs() < 1e-5);
        assert!((lp[1] + 0.5 + log_sqrt_2pi).abs() < 1e-5);
    }

    #[test]
    fn test_squashed_log_prob_at_origin() {
        let device = Default::default();
        // x = 0 -> y = 0, correction = log(scale + eps)
        let lp = values(squashed_log_prob(
            Tensor::zeros([1, 2], &device),
            Tensor::zeros([1, 2], &device),
            Tensor::zeros([1, 2], &device),
            Tensor::from_floats([[2.0, 2.0]], &device),
        ));

        let log_sqrt_2pi = 0.5 * (2.0 * std::f32::consts::PI).ln();
        let expected = 2.0 * (-log_sqrt_2pi - (2.0f32 + SQUASH_EPSILON).ln());
        assert_eq!(lp.len(), 1);
        assert!((lp[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_squashed_log_prob_finite_at_saturation() {
        let device = Default::default();
        // tanh(50) == 1 in f32, so 1 - y² == 0 and only epsilon remains
        let lp = values(squashed_log_prob(
            Tensor::from_floats([[50.0]], &device),
            Tensor::from_floats([[50.0]], &device),
            Tensor::zeros([1, 1], &device),
            Tensor::ones([1, 1], &device),
        ));

        let log_sqrt_2pi = 0.5 * (2.0 * std::f32::consts::PI).ln();
        assert!(lp[0].is_finite());
        assert!((lp[0] - (-log_sqrt_2pi - SQUASH_EPSILON.ln())).abs() < 1e-3);
    }

    #[test]
    fn test_rsample_shape() {
        let device = Default::default();
        let x = rsample::<B>(Tensor::zeros([7, 3], &device), Tensor::ones([7, 3], &device));
        assert_eq!(x.dims(), [7, 3]);
    }
}
