use bitflags::bitflags;
use glam::Vec4;
use slotmap::new_key_type;

use crate::resources::texture::TextureHandle;

// Texture maps a material samples
bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        const COLOR     = 1 << 0;
        const NORMAL    = 1 << 1;
        const AO        = 1 << 2;
        const ROUGHNESS = 1 << 3;
    }
}

new_key_type! {
    /// Key of a material in the scene's material table.
    pub struct MaterialKey;
}

/// Texture slot order used by the PBR program.
pub const MATERIAL_TEXTURE_ORDER: [TextureFlags; 4] = [
    TextureFlags::COLOR,
    TextureFlags::NORMAL,
    TextureFlags::AO,
    TextureFlags::ROUGHNESS,
];

/// Optional texture maps of a [`Material`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialTextures {
    pub color: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub ao: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
}

impl MaterialTextures {
    /// Handle stored for a single flag. Multi-bit flags return `None`.
    #[must_use]
    pub fn get(&self, flag: TextureFlags) -> Option<TextureHandle> {
        match flag {
            f if f == TextureFlags::COLOR => self.color,
            f if f == TextureFlags::NORMAL => self.normal,
            f if f == TextureFlags::AO => self.ao,
            f if f == TextureFlags::ROUGHNESS => self.roughness,
            _ => None,
        }
    }

    fn slot_mut(&mut self, flag: TextureFlags) -> Option<&mut Option<TextureHandle>> {
        match flag {
            f if f == TextureFlags::COLOR => Some(&mut self.color),
            f if f == TextureFlags::NORMAL => Some(&mut self.normal),
            f if f == TextureFlags::AO => Some(&mut self.ao),
            f if f == TextureFlags::ROUGHNESS => Some(&mut self.roughness),
            _ => None,
        }
    }

    /// Flags of every present handle.
    #[must_use]
    pub fn present(&self) -> TextureFlags {
        MATERIAL_TEXTURE_ORDER
            .iter()
            .filter(|flag| self.get(**flag).is_some())
            .fold(TextureFlags::empty(), |acc, flag| acc | *flag)
    }
}

// PBR material
// ----------------------------------------------------------------------------

/// Physically based surface description shared by props, markers and models.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// Specular exponent; bigger is a sharper highlight.
    pub specularity: f32,
    /// Inverse roughness.
    pub smoothness: f32,
    /// 0 is isotropic, 1 stretches the highlight along the tangent.
    pub anisotropy: f32,
    flags: TextureFlags,
    textures: MaterialTextures,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

impl Material {
    #[must_use]
    pub fn new(diffuse: Vec4) -> Self {
        Self {
            diffuse,
            specular: Vec4::ONE,
            specularity: 64.0,
            smoothness: 0.2,
            anisotropy: 0.0,
            flags: TextureFlags::empty(),
            textures: MaterialTextures::default(),
        }
    }

    #[must_use]
    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness;
        self
    }

    #[must_use]
    pub fn with_anisotropy(mut self, anisotropy: f32) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    /// Attaches a texture and enables its flag.
    #[must_use]
    pub fn with_texture(mut self, flag: TextureFlags, handle: TextureHandle) -> Self {
        self.set_texture(flag, Some(handle));
        self
    }

    /// Sets or removes the texture for a single flag. Setting enables the
    /// flag, removing disables it.
    pub fn set_texture(&mut self, flag: TextureFlags, handle: Option<TextureHandle>) {
        if let Some(slot) = self.textures.slot_mut(flag) {
            *slot = handle;
            self.flags.set(flag, handle.is_some());
        }
    }

    /// Toggles sampling of already attached maps (debug panel checkboxes).
    pub fn set_flag(&mut self, flag: TextureFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn textures(&self) -> &MaterialTextures {
        &self.textures
    }

    /// Flags that are both enabled and backed by a handle. Only these are
    /// uploaded and bound, so an absent texture is never sampled.
    #[inline]
    #[must_use]
    pub fn effective_flags(&self) -> TextureFlags {
        self.flags & self.textures.present()
    }

    /// `(slot offset, handle)` of every map that will be sampled.
    pub fn sampled_textures(&self) -> impl Iterator<Item = (u32, TextureHandle)> + '_ {
        let active = self.effective_flags();
        MATERIAL_TEXTURE_ORDER
            .iter()
            .enumerate()
            .filter(move |(_, flag)| active.contains(**flag))
            .filter_map(|(offset, flag)| self.textures.get(*flag).map(|h| (offset as u32, h)))
    }
}
