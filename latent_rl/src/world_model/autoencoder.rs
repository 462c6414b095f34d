//! Observation autoencoder.
//!
//! ```text
//! encode: x ─ Linear(input→hidden) ─ ReLU ─ Linear(hidden→latent) ─ ReLU ─▶ z  (z >= 0)
//! decode: z ─ Linear(latent→hidden) ─ ReLU ─ Linear(hidden→input) ─────────▶ x_hat
//! ```
//!
//! All layers are bias free.

use burn::module::Module;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result};
use crate::nn::{Mlp, MlpConfig};

/// Configuration for [`AutoEncoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoEncoderConfig {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub latent_dim: usize,
}

impl AutoEncoderConfig {
    pub fn new(input_dim: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            latent_dim,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            self.input_dim > 0 && self.hidden_dim > 0 && self.latent_dim > 0,
            || format!("autoencoder dims must be positive, got {:?}", self),
        )
    }

    /// Initialize, reporting an invalid configuration as an error.
    pub fn try_init<B: Backend>(&self, device: &B::Device) -> Result<AutoEncoder<B>> {
        self.validate()?;

        let encoder = MlpConfig::new(&[self.input_dim, self.hidden_dim, self.latent_dim])
            .with_bias(false)
            .with_activate_output(true)
            .init(device);
        let decoder = MlpConfig::new(&[self.latent_dim, self.hidden_dim, self.input_dim])
            .with_bias(false)
            .init(device);

        let model = AutoEncoder { encoder, decoder };
        log::debug!(
            "autoencoder {} -> {} -> {}: {} params",
            self.input_dim,
            self.hidden_dim,
            self.latent_dim,
            model.num_params()
        );
        Ok(model)
    }

    /// Initialize. Panics if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &B::Device) -> AutoEncoder<B> {
        self.try_init(device).unwrap_or_else(|e| panic!("{}", e))
    }
}

/// Compresses observations to a non-negative latent and reconstructs them.
#[derive(Module, Debug)]
pub struct AutoEncoder<B: Backend> {
    encoder: Mlp<B>,
    decoder: Mlp<B>,
}

impl<B: Backend> AutoEncoder<B> {
    /// Reconstruct `x` and return `(x_hat, z)`.
    pub fn forward(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let z = self.encode(x);
        let x_hat = self.decode(z.clone());
        (x_hat, z)
    }

    /// [batch, input_dim] -> [batch, latent_dim]
    pub fn encode(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.encoder.forward(x)
    }

    /// [batch, latent_dim] -> [batch, input_dim]
    pub fn decode(&self, z: Tensor<B, 2>) -> Tensor<B, 2> {
        self.decoder.forward(z)
    }

    pub fn input_dim(&self) -> usize {
        self.encoder.d_input()
    }

    pub fn latent_dim(&self) -> usize {
        self.encoder.d_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_matches_encode_decode() {
        let device = Default::default();
        let ae: AutoEncoder<TestBackend> = AutoEncoderConfig::new(12, 32, 6).init(&device);

        let x = Tensor::<TestBackend, 2>::random([8, 12], Distribution::Normal(0.0, 1.0), &device);
        let (x_hat, z) = ae.forward(x.clone());

        let z_direct = ae.encode(x);
        let x_hat_direct = ae.decode(z_direct.clone());

        assert_eq!(z.dims(), [8, 6]);
        assert_eq!(x_hat.dims(), [8, 12]);

        let z: Vec<f32> = z.into_data().to_vec().unwrap();
        let z_direct: Vec<f32> = z_direct.into_data().to_vec().unwrap();
        assert_eq!(z, z_direct);

        let x_hat: Vec<f32> = x_hat.into_data().to_vec().unwrap();
        let x_hat_direct: Vec<f32> = x_hat_direct.into_data().to_vec().unwrap();
        assert_eq!(x_hat, x_hat_direct);
    }

    #[test]
    fn test_latent_is_non_negative() {
        let device = Default::default();
        let ae: AutoEncoder<TestBackend> = AutoEncoderConfig::new(5, 16, 4).init(&device);

        let x = Tensor::<TestBackend, 2>::random([64, 5], Distribution::Normal(0.0, 10.0), &device);
        assert!(ae.encode(x).min().into_scalar() >= 0.0);
    }

    #[test]
    fn test_bias_free_maps_zero_to_zero() {
        let device = Default::default();
        let ae: AutoEncoder<TestBackend> = AutoEncoderConfig::new(5, 16, 4).init(&device);

        let (x_hat, z) = ae.forward(Tensor::zeros([2, 5], &device));
        assert_eq!(z.abs().sum().into_scalar(), 0.0);
        assert_eq!(x_hat.abs().sum().into_scalar(), 0.0);
    }

    #[test]
    fn test_dims_and_param_count() {
        let device = Default::default();
        let ae: AutoEncoder<TestBackend> = AutoEncoderConfig::new(10, 20, 3).init(&device);

        assert_eq!(ae.input_dim(), 10);
        assert_eq!(ae.latent_dim(), 3);
        // Four bias-free layers: 10*20 + 20*3 + 3*20 + 20*10
        assert_eq!(ae.num_params(), 200 + 60 + 60 + 200);
    }

    #[test]
    fn test_zero_dim_rejected() {
        let err = AutoEncoderConfig::new(10, 0, 3)
            .try_init::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }
}
