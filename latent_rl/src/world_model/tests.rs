//! Tests for the belief forecaster.
//!
//! These cover the wiring of the full model:
//! - Output shapes for full and partial horizons
//! - Causality across stacked blocks
//! - Padding isolation
//! - Parameter layout and train/inference behavior

use super::*;
use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use burn::tensor::{Bool, Distribution, Int, TensorData};

type B = NdArray<f32>;

const LATENT: usize = 4;
const CONDITION: usize = 2;
const HORIZON: usize = 6;
const HIDDEN: usize = 16;

fn config() -> BeliefConfig {
    BeliefConfig::new(LATENT, CONDITION, HORIZON, HIDDEN).with_num_layers(2)
}

fn random_batch(batch: usize, t: usize) -> BeliefBatch<B> {
    let device = Default::default();
    BeliefBatch::unpadded(
        Tensor::random([batch, LATENT], Distribution::Normal(0.0, 1.0), &device),
        Tensor::random([batch, t, CONDITION], Distribution::Normal(0.0, 1.0), &device),
        Tensor::random([batch, t, 1], Distribution::Normal(0.0, 1.0), &device),
    )
}

fn padding(flags: Vec<bool>, batch: usize, t: usize) -> Tensor<B, 2, Bool> {
    Tensor::from_data(TensorData::new(flags, [batch, t]), &Default::default())
}

/// Add large noise to actions and rewards at positions `from..to`.
fn perturb(batch: &BeliefBatch<B>, from: usize, to: usize) -> BeliefBatch<B> {
    let device = Default::default();
    let [b, _, _] = batch.actions.dims();
    let action_noise =
        Tensor::random([b, to - from, CONDITION], Distribution::Normal(0.0, 10.0), &device);
    let reward_noise = Tensor::random([b, to - from, 1], Distribution::Normal(0.0, 10.0), &device);

    let mut out = batch.clone();
    out.actions = batch.actions.clone().slice_assign(
        [0..b, from..to, 0..CONDITION],
        batch.actions.clone().slice([0..b, from..to, 0..CONDITION]) + action_noise,
    );
    out.rewards = batch.rewards.clone().slice_assign(
        [0..b, from..to, 0..1],
        batch.rewards.clone().slice([0..b, from..to, 0..1]) + reward_noise,
    );
    out
}

fn positions(t: Tensor<B, 3>, batch_idx: usize, range: std::ops::Range<usize>) -> Vec<f32> {
    t.slice([batch_idx..batch_idx + 1, range, 0..LATENT])
        .into_data()
        .to_vec()
        .unwrap()
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
    }
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_forward_shape_full_horizon() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);

    let out = model.forward_batch(random_batch(3, HORIZON));
    assert_eq!(out.dims(), [3, HORIZON, LATENT]);
}

#[test]
fn test_forward_shape_partial_horizon() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);

    let out = model.forward_batch(random_batch(2, 3));
    assert_eq!(out.dims(), [2, 3, LATENT]);
}

#[test]
fn test_forward_batch_matches_forward() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);
    let batch = random_batch(2, 4);

    let direct = model.forward(
        batch.latents.clone(),
        batch.actions.clone(),
        batch.rewards.clone(),
        batch.timesteps.clone(),
        None,
    );
    let batched = model.forward_batch(batch);

    let a: Vec<f32> = direct.into_data().to_vec().unwrap();
    let b: Vec<f32> = batched.into_data().to_vec().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unpadded_batch_timesteps() {
    let batch = random_batch(1, 5);
    let timesteps: Vec<i64> = batch.timesteps.clone().into_data().convert::<i64>().to_vec().unwrap();

    assert_eq!(timesteps, vec![0, 1, 2, 3, 4]);
    assert_eq!(batch.horizon(), 5);
    assert!(batch.masks.is_none());
}

// ============================================================================
// Masking
// ============================================================================

#[test]
fn test_stacked_blocks_are_causal() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);
    let batch = random_batch(2, HORIZON);

    let base = model.forward_batch(batch.clone());
    let out = model.forward_batch(perturb(&batch, 3, HORIZON));

    for b in 0..2 {
        assert_close(&positions(base.clone(), b, 0..3), &positions(out.clone(), b, 0..3));
    }
}

#[test]
fn test_padded_tail_does_not_influence_valid_positions() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);

    // Element 0: last two padded; element 1: last one padded
    let flags = vec![
        false, false, false, false, true, true,
        false, false, false, false, false, true,
    ];
    let batch = random_batch(2, HORIZON).with_masks(padding(flags.clone(), 2, HORIZON));

    let base = model.forward_batch(batch.clone());
    let mut perturbed = perturb(&batch, 4, HORIZON);
    perturbed.masks = Some(padding(flags, 2, HORIZON));
    let out = model.forward_batch(perturbed);

    assert_close(&positions(base.clone(), 0, 0..4), &positions(out.clone(), 0, 0..4));
    assert_close(&positions(base, 1, 0..4), &positions(out, 1, 0..4));
}

#[test]
fn test_padded_middle_position_is_invisible() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);

    let flags = vec![false, false, true, false, false, false];
    let batch = random_batch(1, HORIZON).with_masks(padding(flags, 1, HORIZON));

    let base = model.forward_batch(batch.clone());
    let out = model.forward_batch(perturb(&batch, 2, 3));

    assert_close(&positions(base.clone(), 0, 0..2), &positions(out.clone(), 0, 0..2));
    assert_close(&positions(base, 0, 3..HORIZON), &positions(out, 0, 3..HORIZON));
}

#[test]
fn test_timesteps_condition_output() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);
    let batch = random_batch(1, 3);

    let mut shifted = batch.clone();
    shifted.timesteps = Tensor::<B, 1, Int>::arange(3..6, &device);

    let a: Vec<f32> = model.forward_batch(batch).into_data().to_vec().unwrap();
    let b: Vec<f32> = model.forward_batch(shifted).into_data().to_vec().unwrap();
    assert_ne!(a, b);
}

// ============================================================================
// Parameters and modes
// ============================================================================

#[test]
fn test_parameter_count() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);

    let h = HIDDEN;
    let block = 4 * h // two layer norms
        + 4 * h * h + 4 * h // attention projections + biases
        + 2 * (h * h + h); // feed-forward
    let expected = CONDITION * LATENT
        + LATENT
        + 3 * LATENT * h
        + HORIZON * h
        + 2 * 2 * h
        + 2 * block
        + h * LATENT;

    assert_eq!(model.num_params(), expected);
    assert_eq!(model.num_layers(), 2);
    assert_eq!(model.seq_len(), HORIZON);
    assert_eq!(model.latent_dim(), LATENT);
    assert_eq!(model.condition_dim(), CONDITION);
}

#[test]
fn test_inference_is_deterministic() {
    let device = Default::default();
    let model: DirectForecastingBelief<B> = config().init(&device);
    let batch = random_batch(2, HORIZON);

    let a: Vec<f32> = model.forward_batch(batch.clone()).into_data().to_vec().unwrap();
    let b: Vec<f32> = model.forward_batch(batch).into_data().to_vec().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_training_backend_applies_dropout() {
    type AdB = Autodiff<NdArray<f32>>;
    let device = Default::default();
    let model: DirectForecastingBelief<AdB> = config().with_dropout(0.5).init(&device);

    let latents = Tensor::<AdB, 2>::random([2, LATENT], Distribution::Normal(0.0, 1.0), &device);
    let actions =
        Tensor::<AdB, 3>::random([2, HORIZON, CONDITION], Distribution::Normal(0.0, 1.0), &device);
    let rewards = Tensor::<AdB, 3>::random([2, HORIZON, 1], Distribution::Normal(0.0, 1.0), &device);
    let batch = BeliefBatch::unpadded(latents, actions, rewards);

    let a: Vec<f32> = model.forward_batch(batch.clone()).into_data().to_vec().unwrap();
    let b: Vec<f32> = model.forward_batch(batch).into_data().to_vec().unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_gradients_reach_input_embedding() {
    type AdB = Autodiff<NdArray<f32>>;
    let device = Default::default();
    let model: DirectForecastingBelief<AdB> = config().with_dropout(0.0).init(&device);

    let latents = Tensor::<AdB, 2>::random([2, LATENT], Distribution::Normal(0.0, 1.0), &device)
        .require_grad();
    let actions =
        Tensor::<AdB, 3>::random([2, HORIZON, CONDITION], Distribution::Normal(0.0, 1.0), &device);
    let rewards = Tensor::<AdB, 3>::random([2, HORIZON, 1], Distribution::Normal(0.0, 1.0), &device);

    let target = Tensor::<AdB, 3>::zeros([2, HORIZON, LATENT], &device);
    let predicted = model.forward_batch(BeliefBatch::unpadded(latents.clone(), actions, rewards));
    let grads = forecast_loss(predicted, target, None).backward();

    let grad = latents.grad(&grads).expect("latents should receive a gradient");
    assert_eq!(grad.dims(), [2, LATENT]);
    assert!(grad.abs().sum().into_scalar() > 0.0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = BeliefConfig::new(8, 3, 20, 64);

    assert_eq!(config.num_layers, 10);
    assert_eq!(config.num_heads, 4);
    assert_eq!(config.attention_dropout, 0.1);
    assert_eq!(config.residual_dropout, 0.1);
    assert_eq!(config.hidden_dropout, 0.1);
    assert_eq!(config.init.std, 0.02);
}

#[test]
fn test_invalid_config_is_reported() {
    let err = BeliefConfig::new(4, 2, 6, 18)
        .with_num_heads(4)
        .try_init::<B>(&Default::default())
        .unwrap_err();
    assert!(err.to_string().contains("divisible"));

    assert!(BeliefConfig::new(4, 2, 0, 16).validate().is_err());
    assert!(BeliefConfig::new(4, 2, 6, 16).with_hidden_dropout(1.0).validate().is_err());
}
