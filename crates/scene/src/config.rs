use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Upper bound on scattered instances per field.
pub const MAX_INSTANCES: u32 = 100_000;

/// Full description of one scene. Every section is optional except the
/// camera, but a scene must draw at least one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub name: String,
    /// Multiplier applied to elapsed seconds before it reaches `u_time`.
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub sky: Option<SkyConfig>,
    #[serde(default)]
    pub field: Option<FieldConfig>,
    #[serde(default)]
    pub subject: Option<SubjectConfig>,
}

fn default_time_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::ONE,
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

/// Sun placement and haze for the sky background. Angles are radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkyConfig {
    pub elevation: f32,
    pub azimuth: f32,
    pub fog_fade: f32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            elevation: 0.2,
            azimuth: 0.4,
            fog_fade: 0.005,
        }
    }
}

impl SkyConfig {
    /// Direction towards the sun. Not normalized; the shader normalizes.
    pub fn sun_direction(&self) -> Vec3 {
        Vec3::new(
            self.azimuth.sin(),
            self.elevation.sin(),
            -self.azimuth.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMesh {
    /// Tapered grass blade that sways with `u_time`.
    #[default]
    Blade,
    /// Upright quad.
    Plane,
}

impl FieldMesh {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blade => "blade",
            Self::Plane => "plane",
        }
    }
}

/// Procedurally scattered instances on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    pub mesh: FieldMesh,
    pub count: u32,
    /// Extent along X.
    pub width: f32,
    /// Extent along Z.
    pub depth: f32,
    pub seed: u64,
    /// Sway amplitude at the blade tip.
    pub wind: f32,
    pub base_color: Vec4,
    pub tip_color: Vec4,
    pub ground: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            mesh: FieldMesh::Blade,
            count: 500,
            width: 10.0,
            depth: 10.0,
            seed: 1,
            wind: 0.15,
            base_color: Vec4::new(0.05, 0.2, 0.01, 1.0),
            tip_color: Vec4::new(0.5, 0.7, 0.2, 1.0),
            ground: true,
        }
    }
}

/// Single stylized object at the origin, toon shaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectConfig {
    pub color: Vec4,
    /// Rim light strength.
    pub rim: f32,
    /// Rotate about +Y with `u_time`.
    pub spin: bool,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.9, 0.45, 0.3, 1.0),
            rim: 0.6,
            spin: true,
        }
    }
}

impl SceneConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(source: &str) -> Result<Self, SceneError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading scene config");
        Self::from_yaml_str(&source)
    }

    pub fn to_yaml_string(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the field's placement seed. No-op for scenes without a field.
    pub fn reseed(&mut self, seed: u64) {
        if let Some(field) = &mut self.field {
            field.seed = seed;
        }
    }

    /// Check every section against its valid ranges.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.name.trim().is_empty() {
            return Err(SceneError::invalid("name", "must not be empty"));
        }
        if !self.time_scale.is_finite() {
            return Err(SceneError::invalid("time_scale", "must be finite"));
        }
        if self.sky.is_none() && self.field.is_none() && self.subject.is_none() {
            return Err(SceneError::invalid(
                "layers",
                "at least one of sky, field or subject is required",
            ));
        }

        self.camera.validate()?;
        if let Some(sky) = &self.sky {
            sky.validate()?;
        }
        if let Some(field) = &self.field {
            field.validate()?;
        }
        if let Some(subject) = &self.subject {
            subject.validate()?;
        }
        Ok(())
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), SceneError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SceneError::invalid(
                "camera.fov_degrees",
                format!("{} is outside (0, 180)", self.fov_degrees),
            ));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(SceneError::invalid(
                "camera.near/far",
                format!("need 0 < near < far, got {} / {}", self.near, self.far),
            ));
        }
        if !self.position.is_finite() || !self.target.is_finite() {
            return Err(SceneError::invalid("camera.position", "must be finite"));
        }
        if self.position.distance(self.target) <= f32::EPSILON {
            return Err(SceneError::invalid(
                "camera.position",
                "must differ from camera.target",
            ));
        }
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(SceneError::invalid(
                "camera.damping_factor",
                format!("{} is outside (0, 1]", self.damping_factor),
            ));
        }
        Ok(())
    }
}

impl SkyConfig {
    fn validate(&self) -> Result<(), SceneError> {
        if !self.elevation.is_finite() || !self.azimuth.is_finite() {
            return Err(SceneError::invalid("sky", "angles must be finite"));
        }
        if !(self.fog_fade >= 0.0 && self.fog_fade.is_finite()) {
            return Err(SceneError::invalid(
                "sky.fog_fade",
                format!("{} must be a finite non-negative number", self.fog_fade),
            ));
        }
        Ok(())
    }
}

impl FieldConfig {
    fn validate(&self) -> Result<(), SceneError> {
        if self.count == 0 || self.count > MAX_INSTANCES {
            return Err(SceneError::invalid(
                "field.count",
                format!("{} is outside 1..={MAX_INSTANCES}", self.count),
            ));
        }
        if !(self.width > 0.0 && self.width.is_finite())
            || !(self.depth > 0.0 && self.depth.is_finite())
        {
            return Err(SceneError::invalid(
                "field.width/depth",
                format!("need positive extents, got {} x {}", self.width, self.depth),
            ));
        }
        if !(self.wind >= 0.0 && self.wind.is_finite()) {
            return Err(SceneError::invalid("field.wind", "must be non-negative"));
        }
        Ok(())
    }
}

impl SubjectConfig {
    fn validate(&self) -> Result<(), SceneError> {
        if !(self.rim >= 0.0 && self.rim.is_finite()) {
            return Err(SceneError::invalid("subject.rim", "must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sky_only(name: &str) -> SceneConfig {
        SceneConfig {
            name: name.into(),
            time_scale: 1.0,
            camera: CameraConfig::default(),
            sky: Some(SkyConfig::default()),
            field: None,
            subject: None,
        }
    }

    #[test]
    fn sun_direction_matches_angles() {
        let sky = SkyConfig {
            elevation: 0.0,
            azimuth: 0.0,
            fog_fade: 0.0,
        };
        assert!((sky.sun_direction() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);

        let d = SkyConfig::default().sun_direction();
        assert!((d.x - 0.4_f32.sin()).abs() < 1e-6);
        assert!((d.y - 0.2_f32.sin()).abs() < 1e-6);
        assert!((d.z + 0.4_f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn valid_config_passes() {
        assert!(sky_only("sky").validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let err = sky_only("  ").validate().unwrap_err();
        assert!(matches!(err, SceneError::Invalid { field: "name", .. }));
    }

    #[test]
    fn scene_without_layers_rejected() {
        let mut config = sky_only("empty");
        config.sky = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SceneError::Invalid { field: "layers", .. }));
    }

    #[test]
    fn camera_ranges_checked() {
        let mut config = sky_only("cam");
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(config.validate().is_err());

        let mut config = sky_only("cam");
        config.camera.fov_degrees = 180.0;
        assert!(config.validate().is_err());

        let mut config = sky_only("cam");
        config.camera.position = config.camera.target;
        assert!(config.validate().is_err());
    }

    #[test]
    fn field_count_bounds_checked() {
        let mut config = sky_only("field");
        config.field = Some(FieldConfig {
            count: 0,
            ..FieldConfig::default()
        });
        assert!(config.validate().is_err());

        config.field = Some(FieldConfig {
            count: MAX_INSTANCES + 1,
            ..FieldConfig::default()
        });
        assert!(config.validate().is_err());

        config.field = Some(FieldConfig {
            width: -1.0,
            ..FieldConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_fills_defaults() {
        let config = SceneConfig::from_yaml_str(
            "name: meadow\ntime_scale: 0.3\nsky: {}\nfield:\n  count: 200\n  mesh: plane\n",
        )
        .unwrap();
        assert_eq!(config.name, "meadow");
        assert_eq!(config.time_scale, 0.3);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.sky, Some(SkyConfig::default()));
        let field = config.field.unwrap();
        assert_eq!(field.count, 200);
        assert_eq!(field.mesh, FieldMesh::Plane);
        assert_eq!(field.width, 10.0);
    }

    #[test]
    fn yaml_unknown_field_rejected() {
        let err = SceneConfig::from_yaml_str("name: x\nsky: {}\nspeed: 3\n").unwrap_err();
        assert!(matches!(err, SceneError::Yaml(_)));
    }

    #[test]
    fn yaml_invalid_values_rejected() {
        let err = SceneConfig::from_yaml_str("name: x\nsky:\n  fog_fade: -1.0\n").unwrap_err();
        assert!(matches!(err, SceneError::Invalid { field: "sky.fog_fade", .. }));
    }

    #[test]
    fn yaml_file_round_trip() {
        let config = sky_only("from-file");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = SceneConfig::from_yaml_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::from_yaml_path(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn reseed_only_touches_field() {
        let mut config = sky_only("sky");
        config.reseed(9);
        assert!(config.field.is_none());

        config.field = Some(FieldConfig::default());
        config.reseed(9);
        assert_eq!(config.field.map(|f| f.seed), Some(9));
    }
}
