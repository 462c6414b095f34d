//! World model demo on synthetic linear dynamics.
//!
//! ```text
//! obs[t+1] = 0.9 · obs[t] + a[t] · W        reward[t] = -mean(obs[t+1]²)
//! ```
//!
//! The autoencoder learns to reconstruct observations; the belief model
//! learns to forecast the (frozen) encoder latents of obs[1..=T] from the
//! latent of obs[0], the actions and the rewards.

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::{Distribution, ElementConversion};

use latent_rl::{
    forecast_loss, reconstruction_loss, AutoEncoder, AutoEncoderConfig, BeliefBatch,
    BeliefConfig, Checkpointer, CheckpointerConfig, DirectForecastingBelief,
};

// ============================================================================
// Backend Type
// ============================================================================

type B = Autodiff<NdArray<f32>>;

// ============================================================================
// Hyperparameters
// ============================================================================

const OBS_DIM: usize = 8;
const ACTION_DIM: usize = 2;
const LATENT_DIM: usize = 4;
const HORIZON: usize = 8;
const BATCH: usize = 16;

const AE_STEPS: usize = 300;
const BELIEF_STEPS: usize = 300;
const LR: f64 = 1e-3;
const LOG_EVERY: usize = 50;

/// Rollouts of the toy system.
struct Rollouts {
    /// [batch, horizon + 1, obs]
    obs: Tensor<B, 3>,
    /// [batch, horizon, action]
    actions: Tensor<B, 3>,
    /// [batch, horizon, 1]
    rewards: Tensor<B, 3>,
}

fn rollouts(dynamics: &Tensor<B, 2>, device: &<B as Backend>::Device) -> Rollouts {
    let mut obs = Tensor::<B, 2>::random([BATCH, OBS_DIM], Distribution::Normal(0.0, 1.0), device);
    let mut all_obs = vec![obs.clone()];
    let mut actions = Vec::with_capacity(HORIZON);
    let mut rewards = Vec::with_capacity(HORIZON);

    for _ in 0..HORIZON {
        let action =
            Tensor::<B, 2>::random([BATCH, ACTION_DIM], Distribution::Uniform(-1.0, 1.0), device);
        obs = obs.mul_scalar(0.9) + action.clone().matmul(dynamics.clone());
        rewards.push(obs.clone().powf_scalar(2.0).mean_dim(1).neg());
        actions.push(action);
        all_obs.push(obs.clone());
    }

    Rollouts {
        obs: Tensor::stack(all_obs, 1),
        actions: Tensor::stack(actions, 1),
        rewards: Tensor::stack(rewards, 1),
    }
}

/// Split [batch, horizon + 1, obs] into obs[0] [batch, obs] and
/// obs[1..] flattened to [batch * horizon, obs].
fn split_first(obs: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let first = obs
        .clone()
        .slice([0..BATCH, 0..1, 0..OBS_DIM])
        .reshape([BATCH, OBS_DIM]);
    let future = obs
        .slice([0..BATCH, 1..HORIZON + 1, 0..OBS_DIM])
        .reshape([BATCH * HORIZON, OBS_DIM]);
    (first, future)
}

fn scalar(t: Tensor<B, 1>) -> f32 {
    t.into_scalar().elem()
}

pub fn run() {
    println!("=== World model demo ===");
    let device = Default::default();

    let dynamics =
        Tensor::<B, 2>::random([ACTION_DIM, OBS_DIM], Distribution::Normal(0.0, 0.5), &device);

    let ae_config = AutoEncoderConfig::new(OBS_DIM, 32, LATENT_DIM);
    let belief_config = BeliefConfig::new(LATENT_DIM, ACTION_DIM, HORIZON, 32)
        .with_num_layers(2)
        .with_num_heads(4);

    let mut ae: AutoEncoder<B> = ae_config.init(&device);
    let mut belief: DirectForecastingBelief<B> = belief_config.init(&device);
    println!(
        "autoencoder: {} params, belief: {} params",
        ae.num_params(),
        belief.num_params()
    );

    // ========================================================================
    // Autoencoder
    // ========================================================================

    let mut ae_optimizer = AdamConfig::new().with_epsilon(1e-5).init();
    for step in 1..=AE_STEPS {
        let data = rollouts(&dynamics, &device);
        let flat: Tensor<B, 2> = data.obs.reshape([BATCH * (HORIZON + 1), OBS_DIM]);

        let (x_hat, _) = ae.forward(flat.clone());
        let loss = reconstruction_loss(x_hat, flat);
        let loss_val = scalar(loss.clone());

        let grads = GradientsParams::from_grads(loss.backward(), &ae);
        ae = ae_optimizer.step(LR, ae, grads);

        if step % LOG_EVERY == 0 {
            println!("[ae {:>4}] reconstruction {:.5}", step, loss_val);
        }
    }

    // ========================================================================
    // Belief model
    // ========================================================================

    let checkpoint_dir = std::env::temp_dir().join("latent_rl_world_model");
    let mut checkpointer = match Checkpointer::new(
        CheckpointerConfig::new(&checkpoint_dir)
            .with_save_interval(100)
            .with_keep_last_n(2),
    ) {
        Ok(c) => c,
        Err(e) => {
            println!("cannot create checkpoint dir: {}", e);
            return;
        }
    };
    if let Err(e) = checkpointer.save_config("belief.json", &belief_config) {
        println!("failed to save belief config: {}", e);
    }

    let mut belief_optimizer = AdamConfig::new().with_epsilon(1e-5).init();
    for step in 1..=BELIEF_STEPS {
        let data = rollouts(&dynamics, &device);

        let (first, future) = split_first(data.obs);
        let z0 = ae.encode(first).detach();
        let target = ae
            .encode(future)
            .detach()
            .reshape([BATCH, HORIZON, LATENT_DIM]);

        let pred = belief.forward_batch(BeliefBatch::unpadded(z0, data.actions, data.rewards));
        let loss = forecast_loss(pred, target, None);
        let loss_val = scalar(loss.clone());

        let grads = GradientsParams::from_grads(loss.backward(), &belief);
        belief = belief_optimizer.step(LR, belief, grads);

        if step % LOG_EVERY == 0 {
            println!("[belief {:>4}] forecast {:.5}", step, loss_val);
        }
        if checkpointer.should_save(step) {
            if let Err(e) = checkpointer.save::<B, _>(&belief, step, Some(-loss_val)) {
                println!("checkpoint failed: {}", e);
            }
        }
    }

    // ========================================================================
    // Restore and evaluate without dropout
    // ========================================================================

    match checkpointer.load_best::<B, _>(belief_config.init::<B>(&device), &device) {
        Ok(restored) => {
            let restored = restored.valid();
            let inference_ae = ae.valid();
            let data = rollouts(&dynamics, &device);
            let (first, future) = split_first(data.obs);

            let z0 = inference_ae.encode(first.inner());
            let target = inference_ae
                .encode(future.inner())
                .reshape([BATCH, HORIZON, LATENT_DIM]);
            let pred = restored.forward_batch(BeliefBatch::unpadded(
                z0,
                data.actions.inner(),
                data.rewards.inner(),
            ));
            let loss: f32 = forecast_loss(pred, target, None).into_scalar().elem();
            println!(
                "best checkpoint (metric {:.5}) held-out forecast {:.5}",
                checkpointer.best_metric(),
                loss
            );
        }
        Err(e) => println!("no best checkpoint: {}", e),
    }
    println!("checkpoints in {}", checkpoint_dir.display());
}
