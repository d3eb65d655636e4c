//! Material resolution.
//!
//! Each material record resolves to exactly one [`ResolvedMaterial`], in
//! document order, so material indices in draw groups stay valid. Texture
//! decoding is left to the renderer: a textured material only carries a
//! [`TextureRef`] to the image.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsm_math::{Vec2, Vec3};

use crate::document::MaterialRecord;

/// Flat color used for materials without a diffuse map (`#d1d1d1`).
pub const DEFAULT_COLOR: Vec3 = Vec3::new(209.0 / 255.0, 209.0 / 255.0, 209.0 / 255.0);

/// Texture coordinate wrapping along one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    #[default]
    ClampToEdge,
    MirroredRepeat,
}

impl WrapMode {
    /// Map an exporter wrap name. Unknown names clamp.
    pub fn from_name(name: &str) -> Self {
        match name {
            "repeat" => WrapMode::Repeat,
            "mirror" => WrapMode::MirroredRepeat,
            _ => WrapMode::ClampToEdge,
        }
    }
}

/// Reference to a diffuse texture plus its sampling parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    /// Image path exactly as written in the document
    pub path: String,

    /// UV repeat factor
    pub repeat: Vec2,

    /// Wrapping along u and v
    pub wrap: [WrapMode; 2],

    /// Anisotropic filtering level
    pub anisotropy: u32,
}

impl TextureRef {
    /// Create a reference with default sampling (no repeat, clamped, anisotropy 1).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repeat: Vec2::ONE,
            wrap: [WrapMode::default(); 2],
            anisotropy: 1,
        }
    }

    /// Resolve the texture path against the directory holding the document.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.path)
    }
}

/// How a material is shaded.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialKind {
    /// Diffuse texture, shaded on both sides
    Textured(TextureRef),

    /// Constant color
    FlatColor(Vec3),
}

/// A renderable material parameter set.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMaterial {
    /// Material name (exporter debug name, if any)
    pub name: Option<String>,

    pub kind: MaterialKind,
}

impl Default for ResolvedMaterial {
    fn default() -> Self {
        Self {
            name: None,
            kind: MaterialKind::FlatColor(DEFAULT_COLOR),
        }
    }
}

impl ResolvedMaterial {
    /// Resolve one material record.
    ///
    /// A non-empty `mapDiffuse` yields a textured material; anything else
    /// falls back to [`DEFAULT_COLOR`].
    pub fn resolve(record: &MaterialRecord) -> Self {
        let kind = match record.map_diffuse.as_deref() {
            Some(path) if !path.is_empty() => {
                let mut texture = TextureRef::new(path);
                if let Some([u, v]) = record.map_diffuse_repeat {
                    texture.repeat = Vec2::new(u, v);
                }
                if let Some([u, v]) = &record.map_diffuse_wrap {
                    texture.wrap = [WrapMode::from_name(u), WrapMode::from_name(v)];
                }
                if let Some(anisotropy) = record.map_diffuse_anisotropy {
                    texture.anisotropy = anisotropy.max(1);
                }
                MaterialKind::Textured(texture)
            }
            _ => MaterialKind::FlatColor(DEFAULT_COLOR),
        };

        Self {
            name: record.name.clone(),
            kind,
        }
    }

    /// Base color. Textured materials are white so the map shows unmodified.
    pub fn color(&self) -> Vec3 {
        match &self.kind {
            MaterialKind::Textured(_) => Vec3::ONE,
            MaterialKind::FlatColor(color) => *color,
        }
    }

    /// Diffuse texture, if any.
    pub fn texture_ref(&self) -> Option<&TextureRef> {
        match &self.kind {
            MaterialKind::Textured(texture) => Some(texture),
            MaterialKind::FlatColor(_) => None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.texture_ref().is_some()
    }

    /// Textured materials render both faces; flat ones only the front.
    pub fn double_sided(&self) -> bool {
        self.is_textured()
    }
}

/// Resolve every material record, preserving order and count.
pub fn resolve_materials(records: &[MaterialRecord]) -> Arc<[ResolvedMaterial]> {
    records.iter().map(ResolvedMaterial::resolve).collect()
}
