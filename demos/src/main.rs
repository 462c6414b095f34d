//! latent_rl demos
//!
//! Small end-to-end runs on synthetic data, CPU only (NdArray backend).
//!
//! ```bash
//! # Autoencoder + belief forecaster on linear toy dynamics, with checkpoints
//! cargo run --release -- world-model
//!
//! # Squashed-Gaussian actor and Q critic on a one-step latent bandit
//! cargo run --release -- actor-critic
//!
//! # Expand a hyperparameter grid into belief model configs
//! cargo run --release -- grid '{"num_layers": [2, 4], "hidden_dim": [32, 64]}'
//! ```

mod actor_critic;
mod grid_search;
mod world_model;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "world-model" => world_model::run(),
            "actor-critic" => actor_critic::run(),
            "grid" => grid_search::run(args.get(2).map(String::as_str)),
            _ => {
                println!("Unknown demo: {}", args[1]);
                println!();
                print_usage();
            }
        }
    } else {
        print_usage();
    }
}

fn print_usage() {
    println!("Usage: cargo run --release -- <demo> [args]");
    println!();
    println!("=============================================================================");
    println!("                                  DEMOS");
    println!("=============================================================================");
    println!();
    println!("  world-model                       AutoEncoder + DirectForecastingBelief");
    println!("                                    Synthetic linear dynamics");
    println!("                                    Saves checkpoints to the temp dir");
    println!();
    println!("  actor-critic                      LatentActor + LatentCritic");
    println!("                                    One-step bandit over random latents");
    println!("                                    Bounded actions in [-2, 2]");
    println!();
    println!("  grid [JSON]                       Hyperparameter grid expansion");
    println!("                                    Builds one belief model per combination");
    println!("                                    Invalid combinations are reported");
    println!();
}
