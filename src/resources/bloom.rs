//! Bloom Post-Processing Configuration
//!
//! Bloom here is the classic threshold → separable blur → additive composite
//! chain:
//!
//! 1. **Threshold**: keep pixels whose luminance exceeds
//!    [`BloomSettings::threshold`], zero the rest.
//! 2. **Blur**: horizontal then vertical Gaussian with
//!    [`BloomSettings::blur_size`] taps on each side, sampled every
//!    [`BloomSettings::blur_skip`] texels (coarser sampling, larger glow,
//!    same cost).
//! 3. **Composite**: add the blurred bright pass back onto the scene.
//!
//! All setters clamp to the ranges the debug panel exposes.

use log::warn;

/// Slider ranges exposed by the debug panel.
pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 5.0);
pub const BLUR_SIZE_MAX: u32 = 30;
pub const BLUR_SKIP_RANGE: (f32, f32) = (1.0, 10.0);

/// Bloom post-processing configuration.
///
/// # Usage
///
/// ```rust,ignore
/// let bloom = &mut scene.bloom;
/// bloom.set_threshold(0.8);
/// bloom.set_blur_size(12);
/// bloom.set_blur_skip(2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    threshold: f32,
    blur_size: u32,
    blur_skip: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            blur_size: 0,
            blur_skip: 1.0,
        }
    }
}

impl BloomSettings {
    /// Luminance a pixel must exceed to bloom.
    #[inline]
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Gaussian radius in taps. `0` disables the blur.
    #[inline]
    #[must_use]
    pub fn blur_size(&self) -> u32 {
        self.blur_size
    }

    /// Texel stride between taps.
    #[inline]
    #[must_use]
    pub fn blur_skip(&self) -> f32 {
        self.blur_skip
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = clamp_logged("bloom threshold", threshold, THRESHOLD_RANGE);
    }

    pub fn set_blur_size(&mut self, blur_size: u32) {
        if blur_size > BLUR_SIZE_MAX {
            warn!("bloom blur size {blur_size} clamped to {BLUR_SIZE_MAX}");
        }
        self.blur_size = blur_size.min(BLUR_SIZE_MAX);
    }

    pub fn set_blur_skip(&mut self, blur_skip: f32) {
        self.blur_skip = clamp_logged("bloom blur skip", blur_skip, BLUR_SKIP_RANGE);
    }
}

pub(crate) fn clamp_logged(name: &str, value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        warn!("{name} is NaN, using {min}");
        return min;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{name} {value} clamped to {clamped}");
    }
    clamped
}
