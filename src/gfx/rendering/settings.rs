//! Renderer configuration shared by the application and the render engine

use crate::gfx::resources::texture_resource::ColorSpace;

/// Tone mapping operator applied to lit surfaces.
///
/// Discriminants are the values the shaders switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ToneMapping {
    None = 0,
    Linear = 1,
    #[default]
    Reinhard = 2,
    Cineon = 3,
    AcesFilmic = 4,
}

impl ToneMapping {
    pub const ALL: [ToneMapping; 5] = [
        ToneMapping::None,
        ToneMapping::Linear,
        ToneMapping::Reinhard,
        ToneMapping::Cineon,
        ToneMapping::AcesFilmic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToneMapping::None => "No",
            ToneMapping::Linear => "Linear",
            ToneMapping::Reinhard => "Reinhard",
            ToneMapping::Cineon => "Cineon",
            ToneMapping::AcesFilmic => "ACESFilmic",
        }
    }
}

impl ColorSpace {
    pub fn is_srgb(self) -> bool {
        matches!(self, ColorSpace::Srgb)
    }
}

/// Shadow filtering; the discriminant is the kernel radius in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ShadowMapType {
    /// Single comparison tap
    Basic = 0,
    /// 3x3 filtered comparison taps
    Pcf = 1,
    /// 5x5 filtered comparison taps for soft edges
    #[default]
    PcfSoft = 2,
}

impl ShadowMapType {
    /// Texels sampled on each side of the center tap
    pub fn kernel_radius(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapSettings {
    pub enabled: bool,
    pub kind: ShadowMapType,
}

impl Default for ShadowMapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: ShadowMapType::PcfSoft,
        }
    }
}

/// Renderer-wide switches, mirrored into the global uniform every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub output_color_space: ColorSpace,
    pub tone_mapping: ToneMapping,
    pub tone_mapping_exposure: f32,
    pub shadow_map: ShadowMapSettings,
    pub physically_correct_lights: bool,
    pub antialias: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            output_color_space: ColorSpace::Srgb,
            tone_mapping: ToneMapping::Reinhard,
            tone_mapping_exposure: 3.0,
            shadow_map: ShadowMapSettings::default(),
            physically_correct_lights: true,
            antialias: true,
        }
    }
}

impl RendererSettings {
    /// MSAA sample count for the main pass
    pub fn sample_count(&self) -> u32 {
        if self.antialias {
            4
        } else {
            1
        }
    }
}

/// Size of the presentable surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSurface {
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Device pixel ratio, capped at [`OutputSurface::MAX_PIXEL_RATIO`]
    pub pixel_ratio: f64,
}

impl OutputSurface {
    pub const MAX_PIXEL_RATIO: f64 = 2.0;

    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: device_pixel_ratio.min(Self::MAX_PIXEL_RATIO),
        }
    }

    /// Drawing buffer size in physical pixels
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).round() as u32,
            (self.height as f64 * self.pixel_ratio).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_mapping_discriminants() {
        let values: Vec<u32> = ToneMapping::ALL.iter().map(|t| *t as u32).collect();
        assert_eq!(values, [0, 1, 2, 3, 4]);
        assert_eq!(ToneMapping::AcesFilmic.label(), "ACESFilmic");
    }

    #[test]
    fn test_default_settings() {
        let settings = RendererSettings::default();
        assert_eq!(settings.tone_mapping, ToneMapping::Reinhard);
        assert_eq!(settings.tone_mapping_exposure, 3.0);
        assert!(settings.shadow_map.enabled);
        assert_eq!(settings.shadow_map.kind, ShadowMapType::PcfSoft);
        assert!(settings.output_color_space.is_srgb());
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let surface = OutputSurface::new(800, 600, 3.0);
        assert_eq!(surface.pixel_ratio, 2.0);
        assert_eq!(surface.buffer_size(), (1600, 1200));

        let surface = OutputSurface::new(801, 601, 1.25);
        assert_eq!(surface.pixel_ratio, 1.25);
        assert_eq!(surface.buffer_size(), (1001, 751));
    }
}
