//! Actor-critic demo on a one-step latent bandit.
//!
//! Each episode is a single decision: a latent `z` is drawn, the actor picks
//! an action in `[-2, 2]^A`, and the reward is `-|a - target(z)|²` with
//! `target(z) = 1.5 · tanh(z[..A])`. The critic regresses the reward; the
//! actor minimizes `α · log π(a|z) - Q(z, a)` with a fixed temperature.

use burn::backend::{Autodiff, NdArray};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::activation::tanh;
use burn::tensor::{Distribution, ElementConversion};

use latent_rl::{ActorConfig, CriticConfig, LatentActor, LatentCritic};

// ============================================================================
// Backend Type
// ============================================================================

type B = Autodiff<NdArray<f32>>;

// ============================================================================
// Hyperparameters
// ============================================================================

const LATENT_DIM: usize = 6;
const ACTION_DIM: usize = 2;
const HIDDEN: usize = 64;
const BATCH: usize = 64;
const STEPS: usize = 500;
const ACTOR_LR: f64 = 3e-4;
const CRITIC_LR: f64 = 1e-3;
const ALPHA: f32 = 0.01;
const LOG_EVERY: usize = 50;

fn target(z: Tensor<B, 2>) -> Tensor<B, 2> {
    tanh(z.slice([0..BATCH, 0..ACTION_DIM])).mul_scalar(1.5)
}

/// [batch, 1]
fn reward(action: Tensor<B, 2>, z: Tensor<B, 2>) -> Tensor<B, 2> {
    (action - target(z)).powf_scalar(2.0).sum_dim(1).neg()
}

fn scalar(t: Tensor<B, 1>) -> f32 {
    t.into_scalar().elem()
}

pub fn run() {
    println!("=== Actor-critic demo ===");
    let device = Default::default();

    let mut actor: LatentActor<B> = ActorConfig::new(LATENT_DIM, ACTION_DIM)
        .with_action_range(-2.0, 2.0)
        .with_hidden_dim(HIDDEN)
        .init(&device);
    let mut critic: LatentCritic<B> = CriticConfig::new(LATENT_DIM, ACTION_DIM)
        .with_hidden_dim(HIDDEN)
        .init(&device);

    let mut actor_optimizer = AdamConfig::new().with_epsilon(1e-5).init();
    let mut critic_optimizer = AdamConfig::new().with_epsilon(1e-5).init();

    for step in 1..=STEPS {
        let z = Tensor::<B, 2>::random([BATCH, LATENT_DIM], Distribution::Normal(0.0, 1.0), &device);

        // ====================================================================
        // CRITIC UPDATE
        // ====================================================================

        let sample = actor.get_action(z.clone());
        let action = sample.action.detach();
        let r = reward(action.clone(), z.clone());

        let q = critic.forward(z.clone(), action);
        let critic_loss = (q - r.clone()).powf_scalar(2.0).mean();
        let critic_loss_val = scalar(critic_loss.clone());

        let critic_grads = GradientsParams::from_grads(critic_loss.backward(), &critic);
        critic = critic_optimizer.step(CRITIC_LR, critic, critic_grads);

        // ====================================================================
        // ACTOR UPDATE
        // ====================================================================

        let sample = actor.get_action(z.clone());
        let q_new = critic.forward(z.clone(), sample.action);
        let actor_loss = (sample.log_prob.mul_scalar(ALPHA) - q_new).mean();
        let actor_loss_val = scalar(actor_loss.clone());

        let actor_grads = GradientsParams::from_grads(actor_loss.backward(), &actor);
        actor = actor_optimizer.step(ACTOR_LR, actor, actor_grads);

        if step % LOG_EVERY == 0 {
            let greedy = reward(actor.deterministic_action(z.clone()), z);
            println!(
                "[{:>4}] critic {:.4}  actor {:.4}  sampled reward {:.4}  greedy reward {:.4}",
                step,
                critic_loss_val,
                actor_loss_val,
                scalar(r.mean()),
                scalar(greedy.mean())
            );
        }
    }
}
