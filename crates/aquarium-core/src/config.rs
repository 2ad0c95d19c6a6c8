//! Scene configuration loading and validation

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Largest school a config may ask for
pub const MAX_FISH_LIMIT: usize = 10_000;

/// Widest spotlight cone the renderer supports
pub const MAX_SPOT_ANGLE_DEGREES: f32 = 90.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AquariumConfig {
    #[serde(default)]
    pub fish: FishConfig,
    #[serde(default)]
    pub squid: SquidConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishConfig {
    /// Number of fish created at startup (upper bound of the count slider)
    #[serde(default = "default_max_fish")]
    pub max: usize,
    /// Fish visible after startup
    #[serde(default = "default_initial_visible")]
    pub initial_visible: usize,
    /// Seed for the per-fish randomization (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Uniform scale range
    #[serde(default = "default_fish_scale")]
    pub scale: [f32; 2],
    /// Pivot offset range along X
    #[serde(default = "default_fish_x")]
    pub x: [f32; 2],
    /// Pivot offset range along Y
    #[serde(default = "default_fish_y")]
    pub y: [f32; 2],
    /// Rotation speed range in radians per frame
    #[serde(default = "default_fish_speed")]
    pub speed: [f32; 2],
    /// Model orientation as XYZ Euler angles in radians
    #[serde(default = "default_fish_rotation")]
    pub rotation: [f32; 3],
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            max: default_max_fish(),
            initial_visible: default_initial_visible(),
            seed: None,
            scale: default_fish_scale(),
            x: default_fish_x(),
            y: default_fish_y(),
            speed: default_fish_speed(),
            rotation: default_fish_rotation(),
        }
    }
}

fn default_max_fish() -> usize {
    500
}

fn default_initial_visible() -> usize {
    250
}

fn default_fish_scale() -> [f32; 2] {
    [0.005, 0.03]
}

fn default_fish_x() -> [f32; 2] {
    [0.3, 0.8]
}

fn default_fish_y() -> [f32; 2] {
    [-0.5, 0.5]
}

fn default_fish_speed() -> [f32; 2] {
    [0.001, 0.03]
}

fn default_fish_rotation() -> [f32; 3] {
    [FRAC_PI_2, PI, 0.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquidConfig {
    /// Model scale factor
    pub scale: f32,
    /// Model offset inside its pivot
    pub model_offset: [f32; 3],
    /// Pivot position
    pub position: [f32; 3],
    /// Pivot tilt about X in radians
    pub tilt: f32,
    /// Rotation about the pivot's local Y per frame
    pub rotate_step: f32,
}

impl Default for SquidConfig {
    fn default() -> Self {
        Self {
            scale: 30.0,
            model_offset: [-95.0, 0.0, 0.0],
            position: [-550.0, 700.0, 550.0],
            tilt: -FRAC_PI_6,
            rotate_step: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial distance from the origin along +Z
    pub distance: f32,
    /// Orbit sensitivity in radians per pixel
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 10000.0,
            distance: 10.0,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    /// Directional light illuminance in lux
    pub directional_illuminance: f32,
    pub directional_position: [f32; 3],
    /// Number of spotlights in the line
    pub spot_count: usize,
    /// Height of every spotlight
    pub spot_height: f32,
    /// Distance between consecutive spotlights on the same side
    pub spot_spacing: f32,
    /// Outer cone half-angle in degrees, at most 90
    pub spot_angle_degrees: f32,
    /// Spotlight reach in world units
    pub spot_range: f32,
    /// Lumens emitted per unit of slider intensity
    pub lumens_per_unit: f32,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            directional_illuminance: 5000.0,
            directional_position: [50.0, 100.0, 0.0],
            spot_count: 7,
            spot_height: 5.0,
            spot_spacing: 10.0,
            spot_angle_degrees: MAX_SPOT_ANGLE_DEGREES,
            spot_range: 1000.0,
            lumens_per_unit: 200_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Edge length of the reflection render target in pixels
    pub resolution: u32,
    pub near: f32,
    pub far: f32,
    /// Height of the floor and the mirror
    pub height: f32,
    /// Edge length of the floor and the mirror planes
    pub size: f32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            resolution: 2048,
            near: 0.1,
            far: 1000.0,
            height: -2.0,
            size: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub fish_material: String,
    pub fish_model: String,
    pub squid_model: String,
    pub background: String,
    /// Directory holding the glass cage maps
    pub glass_dir: String,
    /// Directory holding the water maps
    pub water_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            fish_material: "fish/13007_Blue-Green_Reef_Chromis_v2_l3.mtl".to_string(),
            fish_model: "fish/13007_Blue-Green_Reef_Chromis_v2_l3.obj".to_string(),
            squid_model: "squid/11097_squid_v1.obj".to_string(),
            background: "image/test_img.jpg".to_string(),
            glass_dir: "image/glass".to_string(),
            water_dir: "image/water".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub speed_range: [f32; 2],
    pub speed_default: f32,
    pub light_range: [f32; 2],
    pub light_default: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            speed_range: [0.0, 5.0],
            speed_default: 1.0,
            light_range: [0.0, 5.0],
            light_default: 1.0,
        }
    }
}

impl AquariumConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AquariumConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults when missing
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&content)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else {
            info!(
                path = %path.display(),
                "Configuration file not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check ranges and counts for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("fish.scale", self.fish.scale),
            ("fish.x", self.fish.x),
            ("fish.y", self.fish.y),
            ("fish.speed", self.fish.speed),
            ("controls.speed_range", self.controls.speed_range),
            ("controls.light_range", self.controls.light_range),
        ];
        for (name, [min, max]) in ranges {
            if !(min.is_finite() && max.is_finite()) || min > max {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an ordered pair of finite numbers, got [{}, {}]",
                    name, min, max
                )));
            }
        }

        if self.fish.initial_visible > self.fish.max {
            return Err(ConfigError::Invalid(format!(
                "fish.initial_visible ({}) exceeds fish.max ({})",
                self.fish.initial_visible, self.fish.max
            )));
        }

        if self.fish.max > MAX_FISH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "fish.max ({}) exceeds the limit of {}",
                self.fish.max, MAX_FISH_LIMIT
            )));
        }

        let angle = self.lights.spot_angle_degrees;
        if angle.is_nan() || angle <= 0.0 || angle > MAX_SPOT_ANGLE_DEGREES {
            return Err(ConfigError::Invalid(format!(
                "lights.spot_angle_degrees must be in (0, {}], got {}",
                MAX_SPOT_ANGLE_DEGREES, angle
            )));
        }

        if self.lights.spot_range.is_nan() || self.lights.spot_range <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lights.spot_range must be positive, got {}",
                self.lights.spot_range
            )));
        }

        if self.lights.spot_count == 0 {
            return Err(ConfigError::Invalid(
                "lights.spot_count must be at least 1".to_string(),
            ));
        }

        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                self.camera.fov_degrees
            )));
        }

        for (name, near, far) in [
            ("camera", self.camera.near, self.camera.far),
            ("mirror", self.mirror.near, self.mirror.far),
        ] {
            if !(near > 0.0 && near < far) {
                return Err(ConfigError::Invalid(format!(
                    "{}.near must be positive and below far, got {} / {}",
                    name, near, far
                )));
            }
        }

        if self.mirror.resolution == 0 {
            return Err(ConfigError::Invalid(
                "mirror.resolution must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AquariumConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fish.max, 500);
        assert_eq!(config.lights.spot_count, 7);
        assert_eq!(config.camera.fov_degrees, 50.0);
        assert_eq!(config.camera.distance, 10.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
[fish]
max = 120
initial_visible = 60
seed = 7

[camera]
fov_degrees = 60.0
"#;

        let config = AquariumConfig::from_toml(toml).unwrap();
        assert_eq!(config.fish.max, 120);
        assert_eq!(config.fish.initial_visible, 60);
        assert_eq!(config.fish.seed, Some(7));
        assert_eq!(config.fish.speed, [0.001, 0.03]);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.far, 10000.0);
        assert_eq!(config.squid, SquidConfig::default());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let toml = r#"
[fish]
speed = [0.03, 0.001]
"#;

        let err = AquariumConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("fish.speed")));
    }

    #[test]
    fn test_rejects_initial_count_above_max() {
        let mut config = AquariumConfig::default();
        config.fish.initial_visible = config.fish.max + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_school() {
        let mut config = AquariumConfig::default();
        config.fish.max = MAX_FISH_LIMIT;
        config.validate().unwrap();

        config.fish.max = 100_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("fish.max")));
    }

    #[test]
    fn test_spot_cone_bounds() {
        let mut config = AquariumConfig::default();
        assert_eq!(config.lights.spot_angle_degrees, MAX_SPOT_ANGLE_DEGREES);

        config.lights.spot_angle_degrees = 120.0;
        assert!(config.validate().is_err());
        config.lights.spot_angle_degrees = 0.0;
        assert!(config.validate().is_err());
        config.lights.spot_angle_degrees = 45.0;
        config.lights.spot_range = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aquarium.toml");

        let mut config = AquariumConfig::default();
        config.fish.seed = Some(42);
        config.lights.spot_spacing = 12.5;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = AquariumConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AquariumConfig::from_file(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(loaded, AquariumConfig::default());
    }
}
