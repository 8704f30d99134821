//! Transient render-time flags
//!
//! Captures may override background, wireframe and shadows for a single
//! render. [`ScopedFlags`] applies the override and puts the previous flags
//! back when it goes out of scope.

use serde::{Deserialize, Serialize};

use super::SceneProvider;

/// Background fill for a render.
///
/// Serialized as `"transparent"` or `"#rrggbbaa"` so it reads the same in
/// XML templates and JSON manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundSpec {
    /// Fully transparent background (alpha 0)
    Transparent,
    /// Solid RGBA colour
    Solid([u8; 4]),
}

impl BackgroundSpec {
    pub const WHITE: BackgroundSpec = BackgroundSpec::Solid([255, 255, 255, 255]);

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            BackgroundSpec::Transparent => [0, 0, 0, 0],
            BackgroundSpec::Solid(c) => *c,
        }
    }
}

impl From<BackgroundSpec> for String {
    fn from(spec: BackgroundSpec) -> String {
        match spec {
            BackgroundSpec::Transparent => "transparent".to_string(),
            BackgroundSpec::Solid([r, g, b, a]) => format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a),
        }
    }
}

impl TryFrom<String> for BackgroundSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(BackgroundSpec::Transparent);
        }
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| format!("background '{}' must be 'transparent' or '#rrggbb[aa]'", value))?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(format!("background '{}' must have 6 or 8 hex digits", value));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("background '{}': {}", value, e))
        };
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(BackgroundSpec::Solid([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::Solid([48, 48, 52, 255])
    }
}

/// Flags read by surfaces while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFlags {
    pub background: BackgroundSpec,
    pub wireframe: bool,
    pub shadows: bool,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            background: BackgroundSpec::default(),
            wireframe: false,
            shadows: true,
        }
    }
}

/// Per-capture overrides; `None` keeps the scene's current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub background: Option<BackgroundSpec>,
    pub wireframe: Option<bool>,
    pub shadows: Option<bool>,
}

impl FlagOverrides {
    pub fn apply(&self, flags: RenderFlags) -> RenderFlags {
        RenderFlags {
            background: self.background.unwrap_or(flags.background),
            wireframe: self.wireframe.unwrap_or(flags.wireframe),
            shadows: self.shadows.unwrap_or(flags.shadows),
        }
    }
}

/// Applies overrides to a scene and restores the saved flags on drop
pub struct ScopedFlags<'a> {
    scene: &'a mut dyn SceneProvider,
    saved: RenderFlags,
}

impl<'a> ScopedFlags<'a> {
    pub fn new(scene: &'a mut dyn SceneProvider, overrides: &FlagOverrides) -> Self {
        let saved = scene.flags();
        scene.set_flags(overrides.apply(saved));
        Self { scene, saved }
    }

    pub fn scene(&self) -> &dyn SceneProvider {
        &*self.scene
    }
}

impl Drop for ScopedFlags<'_> {
    fn drop(&mut self) {
        self.scene.set_flags(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn test_scoped_flags_restore_on_drop() {
        let mut scene = Scene::new();
        let before = scene.flags();
        {
            let overrides = FlagOverrides {
                background: Some(BackgroundSpec::Transparent),
                wireframe: Some(true),
                shadows: Some(false),
            };
            let scoped = ScopedFlags::new(&mut scene, &overrides);
            let flags = scoped.scene().flags();
            assert!(flags.wireframe);
            assert!(!flags.shadows);
            assert_eq!(flags.background, BackgroundSpec::Transparent);
        }
        assert_eq!(scene.flags(), before);
    }

    #[test]
    fn test_background_string_forms() {
        assert_eq!(BackgroundSpec::try_from("#ff8000".to_string()), Ok(BackgroundSpec::Solid([255, 128, 0, 255])));
        assert_eq!(BackgroundSpec::try_from("Transparent".to_string()), Ok(BackgroundSpec::Transparent));
        assert!(BackgroundSpec::try_from("red".to_string()).is_err());
        assert_eq!(String::from(BackgroundSpec::WHITE), "#ffffffff");
    }

    #[test]
    fn test_empty_overrides_keep_flags() {
        let flags = RenderFlags::default();
        assert_eq!(FlagOverrides::default().apply(flags), flags);
    }
}
