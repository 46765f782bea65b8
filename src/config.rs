//! Start-up configuration

use std::path::PathBuf;

use crate::gfx::rendering::settings::RendererSettings;

/// Environment variable overriding [`ShowcaseConfig::asset_root`]
pub const ASSETS_ENV: &str = "SHOWCASE_ASSETS";
/// Environment variable overriding [`ShowcaseConfig::model_path`]
pub const MODEL_ENV: &str = "SHOWCASE_MODEL";

#[derive(Debug, Clone, PartialEq)]
pub struct ShowcaseConfig {
    pub window_title: String,
    /// Logical window size
    pub window_size: (u32, u32),
    /// Directory the relative asset paths below resolve against
    pub asset_root: PathBuf,
    /// Directory holding `px`, `nx`, `py`, `ny`, `pz` and `nz` faces
    pub env_map_dir: PathBuf,
    pub env_map_extension: String,
    pub model_path: PathBuf,
    pub env_map_intensity: f32,
    pub renderer: RendererSettings,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            window_title: "Helmet Showcase".to_string(),
            window_size: (1280, 720),
            asset_root: PathBuf::from("static"),
            env_map_dir: PathBuf::from("textures/environmentMaps/0"),
            env_map_extension: "jpg".to_string(),
            model_path: PathBuf::from("models/FlightHelmet/glTF/FlightHelmet.gltf"),
            env_map_intensity: 5.0,
            renderer: RendererSettings::default(),
        }
    }
}

impl ShowcaseConfig {
    /// Defaults with `SHOWCASE_ASSETS` and `SHOWCASE_MODEL` applied
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var_os(ASSETS_ENV).map(PathBuf::from),
            std::env::var_os(MODEL_ENV).map(PathBuf::from),
        )
    }

    fn with_overrides(mut self, assets: Option<PathBuf>, model: Option<PathBuf>) -> Self {
        if let Some(root) = assets.filter(|p| !p.as_os_str().is_empty()) {
            log::info!("Asset root overridden: {}", root.display());
            self.asset_root = root;
        }
        if let Some(model) = model.filter(|p| !p.as_os_str().is_empty()) {
            log::info!("Model overridden: {}", model.display());
            self.model_path = model;
        }
        self
    }

    /// Environment map directory under the asset root
    pub fn env_map_path(&self) -> PathBuf {
        self.asset_root.join(&self.env_map_dir)
    }

    /// Model path under the asset root; absolute paths are kept as they are
    pub fn model_file(&self) -> PathBuf {
        self.asset_root.join(&self.model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_bundled_assets() {
        let config = ShowcaseConfig::default();
        assert_eq!(
            config.model_file(),
            PathBuf::from("static/models/FlightHelmet/glTF/FlightHelmet.gltf")
        );
        assert_eq!(
            config.env_map_path(),
            PathBuf::from("static/textures/environmentMaps/0")
        );
        assert_eq!(config.env_map_intensity, 5.0);
    }

    #[test]
    fn test_overrides_replace_paths() {
        let config = ShowcaseConfig::default().with_overrides(
            Some(PathBuf::from("/srv/assets")),
            Some(PathBuf::from("/tmp/other.obj")),
        );
        assert_eq!(config.asset_root, PathBuf::from("/srv/assets"));
        // Joining an absolute path replaces the root
        assert_eq!(config.model_file(), PathBuf::from("/tmp/other.obj"));
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = ShowcaseConfig::default().with_overrides(Some(PathBuf::new()), None);
        assert_eq!(config, ShowcaseConfig::default());
    }
}
