//! Separable Gaussian kernel.
//!
//! Both blur chains (bloom and depth of field) use the same one-sided
//! kernel. For a radius `r` the weights are
//!
//! ```text
//! w[k] = exp(-k² / (2σ²)),  k = 0..=r,  σ = max(r / 2, 1)
//! ```
//!
//! normalized so that `w[0] + 2 · Σ w[1..=r] = 1`. Radius 0 is the identity
//! kernel `[1.0]`. The weights are computed here and uploaded with the blur
//! uniforms, so the shading stage only applies them.

use smallvec::SmallVec;

/// Largest supported radius (taps on each side of the centre).
pub const MAX_KERNEL_RADIUS: usize = 31;

/// One-sided weights, centre first.
pub type KernelWeights = SmallVec<[f32; MAX_KERNEL_RADIUS + 1]>;

/// Normalized one-sided Gaussian weights for `radius`, clamped to
/// [`MAX_KERNEL_RADIUS`].
#[must_use]
pub fn gaussian_weights(radius: u32) -> KernelWeights {
    let radius = (radius as usize).min(MAX_KERNEL_RADIUS);
    let sigma = (radius as f32 * 0.5).max(1.0);
    let denom = 2.0 * sigma * sigma;

    let mut weights: KernelWeights = (0..=radius)
        .map(|k| (-((k * k) as f32) / denom).exp())
        .collect();

    let total = weights[0] + 2.0 * weights[1..].iter().sum::<f32>();
    for weight in &mut weights {
        *weight /= total;
    }
    weights
}

/// Weights packed into the fixed array the blur uniform blocks carry.
#[must_use]
pub fn packed_weights(radius: u32) -> [f32; MAX_KERNEL_RADIUS + 1] {
    let mut packed = [0.0; MAX_KERNEL_RADIUS + 1];
    for (slot, weight) in packed.iter_mut().zip(gaussian_weights(radius)) {
        *slot = weight;
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_zero_is_identity() {
        assert_eq!(gaussian_weights(0).as_slice(), &[1.0]);
    }

    #[test]
    fn weights_sum_to_one() {
        for radius in [1, 4, 9, 30] {
            let w = gaussian_weights(radius);
            let total = w[0] + 2.0 * w[1..].iter().sum::<f32>();
            assert!((total - 1.0).abs() < 1e-5, "radius {radius}: {total}");
        }
    }

    #[test]
    fn weights_fall_off_from_centre() {
        let w = gaussian_weights(8);
        assert!(w.windows(2).all(|pair| pair[0] > pair[1]));
    }
}
