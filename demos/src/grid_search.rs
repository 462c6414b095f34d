//! Hyperparameter grid demo.
//!
//! Expands a JSON grid over [`BeliefConfig`] fields, builds one model per
//! combination and reports its size. Combinations that fail validation
//! (e.g. `hidden_dim` not divisible by `num_heads`) are reported and skipped.

use burn::backend::NdArray;
use burn::module::Module;

use latent_rl::{apply_overrides, BeliefConfig, ConfigGrid};

type B = NdArray<f32>;

const DEFAULT_GRID: &str = r#"{"num_layers": [2, 4], "hidden_dim": [32, 48], "num_heads": [4, 6]}"#;

pub fn run(grid_json: Option<&str>) {
    println!("=== Grid demo ===");
    let device = Default::default();

    let grid = match ConfigGrid::from_json(grid_json.unwrap_or(DEFAULT_GRID)) {
        Ok(grid) => grid,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };
    let base = BeliefConfig::new(16, 4, 10, 64);

    println!(
        "{} combinations over [{}]",
        grid.len(),
        grid.keys().collect::<Vec<_>>().join(", ")
    );

    for (i, overrides) in grid.iter().enumerate() {
        let point = serde_json::Value::Object(overrides.clone());

        let built = apply_overrides(&base, &overrides)
            .and_then(|config| config.try_init::<B>(&device));

        match built {
            Ok(model) => println!("  #{:<3} {}  -> {} params", i, point, model.num_params()),
            Err(e) => println!("  #{:<3} {}  -> skipped: {}", i, point, e),
        }
    }
}
