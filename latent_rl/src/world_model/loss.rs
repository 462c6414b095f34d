//! Reconstruction and forecasting losses for the world model.

use burn::prelude::*;
use burn::tensor::{Bool, ElementConversion};

/// Mean squared reconstruction error.
///
/// # Arguments
/// * `x_hat` - Reconstruction [batch, input_dim]
/// * `x` - Original observation [batch, input_dim]
///
/// # Returns
/// Scalar loss [1]
pub fn reconstruction_loss<B: Backend>(x_hat: Tensor<B, 2>, x: Tensor<B, 2>) -> Tensor<B, 1> {
    (x_hat - x).powf_scalar(2.0).mean()
}

/// Mean squared forecasting error over non-padded positions.
///
/// Padded positions contribute neither to the sum nor to the count.
///
/// # Arguments
/// * `predicted` - Predicted latents [batch, T, latent_dim]
/// * `target` - Target latents [batch, T, latent_dim]
/// * `masks` - Padding flags [batch, T], `true` = padded; `None` = all valid
///
/// # Returns
/// Scalar loss [1]
pub fn forecast_loss<B: Backend>(
    predicted: Tensor<B, 3>,
    target: Tensor<B, 3>,
    masks: Option<Tensor<B, 2, Bool>>,
) -> Tensor<B, 1> {
    let [batch, t, latent_dim] = predicted.dims();
    let squared = (predicted - target).powf_scalar(2.0);

    match masks {
        None => squared.mean(),
        Some(masks) => {
            // 1.0 where valid, 0.0 where padded: [batch, T, 1]
            let valid = masks.bool_not().float().reshape([batch, t, 1]);
            let n_valid = valid.clone().sum().into_scalar().elem::<f32>();
            let denom = (n_valid * latent_dim as f32).max(1.0);

            (squared * valid).sum().div_scalar(denom)
        }
    }
}
