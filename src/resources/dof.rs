//! Layered Depth of Field
//!
//! The scene is re-rendered once per depth band, each band is blurred by an
//! amount that grows with its distance from the focus band, and the layers
//! are composited back to front.
//!
//! # Band layout
//!
//! A fixed window of normalized depth ([`FULL_DEPTH_RANGE`]) is centred on
//! the focus plane and split into [`DOF_LAYER_COUNT`] equal steps, walking
//! from far to near. The outermost edges are then pinned so the bands cover
//! all of `[0, 1]`:
//!
//! ```text
//! depth 1.0 ┬──────────── band 0 (far, holds the background)
//!           │ focus + range/2
//!           ├── band 1
//!           ├── ...
//!           ├── band 4   ◄── contains the focus plane
//!           ├── ...
//!           ├── band 7
//!           │ focus - range/2
//! depth 0.0 ┴──────────── band 8 (near)
//! ```
//!
//! Perspective depth is strongly non-linear, which is why the window is so
//! narrow: 0.009 of normalized depth already spans most of the visible scene.

use log::warn;

use super::bloom::clamp_logged;

/// Number of depth layers.
pub const DOF_LAYER_COUNT: usize = 9;

/// Width of normalized depth split into interior bands.
pub const FULL_DEPTH_RANGE: f32 = 0.009;

/// Index of the band that contains the focus plane.
pub const FOCUS_LAYER: usize = DOF_LAYER_COUNT / 2;

/// Focus plane range exposed by the debug panel.
pub const FOCUS_PLANE_RANGE: (f32, f32) = (0.98, 0.995);

/// Largest per-band blur step, in texels.
pub const MAX_BLUR_STEP: u32 = 8;

/// A half-open slice of normalized depth, `min < depth <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBand {
    pub min: f32,
    pub max: f32,
}

impl DepthBand {
    /// The whole depth range, used when depth of field is off.
    pub const FULL: Self = Self { min: 0.0, max: 1.0 };

    #[inline]
    #[must_use]
    pub fn contains(&self, depth: f32) -> bool {
        (depth > self.min && depth <= self.max) || (self.min == 0.0 && depth == 0.0)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max - self.min
    }
}

impl Default for DepthBand {
    fn default() -> Self {
        Self::FULL
    }
}

/// The complete band set for one frame, far to near.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBands([DepthBand; DOF_LAYER_COUNT]);

impl DepthBands {
    /// Splits depth around `focus_plane`.
    ///
    /// The focus plane is clamped so that the interior window stays inside
    /// `[0, 1]`, which keeps every band non-empty. Non-finite input falls
    /// back to the default focus plane.
    #[must_use]
    pub fn around(focus_plane: f32) -> Self {
        let half = FULL_DEPTH_RANGE * 0.5;
        let focus = if focus_plane.is_finite() {
            focus_plane.clamp(half, 1.0 - half)
        } else {
            DofSettings::DEFAULT_FOCUS_PLANE
        };

        let step = FULL_DEPTH_RANGE / DOF_LAYER_COUNT as f32;
        let mut edge = focus + half;
        let mut bands = [DepthBand::FULL; DOF_LAYER_COUNT];
        for band in &mut bands {
            band.max = edge;
            edge -= step;
            band.min = edge;
        }

        bands[0].max = 1.0;
        bands[DOF_LAYER_COUNT - 1].min = 0.0;
        Self(bands)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, layer: usize) -> Option<DepthBand> {
        self.0.get(layer).copied()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[DepthBand] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepthBand> {
        self.0.iter()
    }

    /// Layer index whose band holds `depth`.
    #[must_use]
    pub fn layer_of(&self, depth: f32) -> Option<usize> {
        self.0.iter().position(|band| band.contains(depth))
    }
}

/// Depth-of-field configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofSettings {
    enabled: bool,
    focus_plane: f32,
    blur_step: u32,
}

impl Default for DofSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            focus_plane: Self::DEFAULT_FOCUS_PLANE,
            blur_step: 2,
        }
    }
}

impl DofSettings {
    pub const DEFAULT_FOCUS_PLANE: f32 = 0.990;

    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Normalized depth that stays sharp.
    #[inline]
    #[must_use]
    pub fn focus_plane(&self) -> f32 {
        self.focus_plane
    }

    pub fn set_focus_plane(&mut self, focus_plane: f32) {
        self.focus_plane = clamp_logged("focus plane", focus_plane, FOCUS_PLANE_RANGE);
    }

    /// Extra blur radius, in texels, per band away from the focus band.
    #[inline]
    #[must_use]
    pub fn blur_step(&self) -> u32 {
        self.blur_step
    }

    pub fn set_blur_step(&mut self, blur_step: u32) {
        if blur_step > MAX_BLUR_STEP {
            warn!("blur step {blur_step} clamped to {MAX_BLUR_STEP}");
        }
        self.blur_step = blur_step.min(MAX_BLUR_STEP);
    }

    #[must_use]
    pub fn bands(&self) -> DepthBands {
        DepthBands::around(self.focus_plane)
    }

    /// Gaussian radius for `layer`: zero at the focus band, growing by
    /// [`blur_step`](Self::blur_step) per band in either direction.
    #[inline]
    #[must_use]
    pub fn blur_radius(&self, layer: usize) -> u32 {
        layer.abs_diff(FOCUS_LAYER) as u32 * self.blur_step
    }
}
