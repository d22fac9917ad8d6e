use crate::models::jewelry::JewelryCategory;
use crate::models::pose::PoseConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Address the static file server binds to
    pub bind: String,
    /// Port the static file server listens on
    pub port: u16,
    /// Directory served over HTTP; asset paths resolve against it
    pub app_root: PathBuf,
    /// Model file per jewelry category, relative to `app_root`
    pub asset_paths: BTreeMap<JewelryCategory, PathBuf>,
    /// Category selected when a session starts
    pub initial_category: JewelryCategory,
    /// Uniform scale applied to every loaded model
    pub model_scale: f32,
    /// Camera capture width in pixels
    pub capture_width: u32,
    /// Camera capture height in pixels
    pub capture_height: u32,
    /// Frames per second requested from the camera
    pub target_fps: u32,
    /// Vertical field of view of the scene camera, in degrees
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// Distance of the scene camera from the origin along z
    pub camera_distance: f32,
    /// Pose model options
    pub pose: PoseConfig,
}

impl Default for Config {
    fn default() -> Self {
        let asset_paths = JewelryCategory::ALL
            .iter()
            .map(|c| (*c, PathBuf::from(format!("assets/{}.glb", c))))
            .collect();

        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            app_root: PathBuf::from("public"),
            asset_paths,
            initial_category: JewelryCategory::Necklace,
            model_scale: 0.5,
            capture_width: 640,
            capture_height: 480,
            target_fps: 30,
            camera_fov: 75.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            camera_distance: 5.0,
            pose: PoseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating it with defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.port == 0 {
            return Err("Invalid port: 0. Must be between 1 and 65535".into());
        }

        if self.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", self.bind).into());
        }

        // Every category needs a relative asset path
        for category in JewelryCategory::ALL {
            let path = self
                .asset_paths
                .get(&category)
                .ok_or_else(|| format!("Missing asset path for {}", category))?;

            if path.as_os_str().is_empty() || path.is_absolute() {
                return Err(format!(
                    "Invalid asset path for {}: {}. Must be relative to the app root",
                    category,
                    path.display()
                )
                .into());
            }
        }

        if !(self.model_scale > 0.0) {
            return Err(format!(
                "Invalid model scale: {}. Must be greater than 0",
                self.model_scale
            )
            .into());
        }

        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(format!(
                "Invalid capture size: {}x{}",
                self.capture_width, self.capture_height
            )
            .into());
        }

        if self.target_fps == 0 || self.target_fps > 60 {
            return Err(format!(
                "Invalid target FPS: {}. Must be between 1 and 60",
                self.target_fps
            )
            .into());
        }

        if !(self.camera_fov > 0.0 && self.camera_fov < 180.0) {
            return Err(format!(
                "Invalid camera field of view: {}. Must be between 0 and 180 degrees",
                self.camera_fov
            )
            .into());
        }

        if !(self.camera_near > 0.0 && self.camera_far > self.camera_near) {
            return Err(format!(
                "Invalid camera clipping planes: near {}, far {}",
                self.camera_near, self.camera_far
            )
            .into());
        }

        for (name, value) in [
            ("detection", self.pose.min_detection_confidence),
            ("tracking", self.pose.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!(
                    "Invalid {} confidence: {}. Must be between 0.0 and 1.0",
                    name, value
                )
                .into());
            }
        }

        Ok(())
    }

    /// Reset the file at `path` to the default configuration
    pub fn reset(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.initial_category, JewelryCategory::Necklace);
        assert_eq!(config.model_scale, 0.5);
        assert_eq!((config.capture_width, config.capture_height), (640, 480));
        assert_eq!(config.camera_fov, 75.0);
        assert_eq!(
            config.asset_paths.get(&JewelryCategory::Earrings),
            Some(&PathBuf::from("assets/earrings.glb"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.port = 0;
        assert!(config.validate().is_err());
        config.port = 3000;

        config.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
        config.bind = "127.0.0.1".to_string();

        config.asset_paths.remove(&JewelryCategory::Ring);
        assert!(config.validate().is_err());
        config
            .asset_paths
            .insert(JewelryCategory::Ring, PathBuf::from("/etc/ring.glb"));
        assert!(config.validate().is_err());
        config
            .asset_paths
            .insert(JewelryCategory::Ring, PathBuf::from("assets/ring.glb"));

        config.model_scale = 0.0;
        assert!(config.validate().is_err());
        config.model_scale = 0.5;

        config.target_fps = 0;
        assert!(config.validate().is_err());
        config.target_fps = 100;
        assert!(config.validate().is_err());
        config.target_fps = 30;

        config.camera_far = 0.05;
        assert!(config.validate().is_err());
        config.camera_far = 1000.0;

        config.pose.min_tracking_confidence = -0.1;
        assert!(config.validate().is_err());
        config.pose.min_tracking_confidence = 0.5;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"necklace\":\"assets/necklace.glb\""));
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("tryon.json");

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let mut edited = config.clone();
        edited.port = 8080;
        edited.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap().port, 8080);

        assert_eq!(Config::reset(&path).unwrap(), Config::default());
        assert_eq!(Config::load(&path).unwrap().port, 3000);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tryon.json");

        let mut config = Config::default();
        config.target_fps = 0;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert!(Config::load(&path).is_err());
    }
}
