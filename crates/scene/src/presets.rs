use glam::{Vec3, Vec4};

use crate::config::{CameraConfig, FieldConfig, FieldMesh, SceneConfig, SkyConfig, SubjectConfig};
use crate::error::SceneError;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["sky", "grass", "grass-wind", "planes", "toon"];

/// Built-in scene configurations.
pub fn preset(name: &str) -> Result<SceneConfig, SceneError> {
    let config = match name {
        "sky" => SceneConfig {
            name: name.into(),
            time_scale: 1.0,
            camera: CameraConfig::default(),
            sky: Some(SkyConfig::default()),
            field: None,
            subject: None,
        },
        "grass" => SceneConfig {
            name: name.into(),
            time_scale: 1.0,
            camera: CameraConfig {
                position: Vec3::new(3.0, 1.5, 3.0),
                ..CameraConfig::default()
            },
            sky: Some(SkyConfig::default()),
            field: Some(FieldConfig {
                count: 5_000,
                ..FieldConfig::default()
            }),
            subject: None,
        },
        // Denser, wider meadow with slowed-down sway
        "grass-wind" => SceneConfig {
            name: name.into(),
            time_scale: 0.3,
            camera: CameraConfig {
                position: Vec3::new(6.0, 2.0, 6.0),
                far: 200.0,
                ..CameraConfig::default()
            },
            sky: Some(SkyConfig {
                elevation: 0.08,
                azimuth: 1.2,
                fog_fade: 0.01,
            }),
            field: Some(FieldConfig {
                count: 40_000,
                width: 30.0,
                depth: 30.0,
                seed: 7,
                wind: 0.35,
                ..FieldConfig::default()
            }),
            subject: None,
        },
        "planes" => SceneConfig {
            name: name.into(),
            time_scale: 1.0,
            camera: CameraConfig {
                position: Vec3::new(4.0, 3.0, 4.0),
                ..CameraConfig::default()
            },
            sky: Some(SkyConfig::default()),
            field: Some(FieldConfig {
                mesh: FieldMesh::Plane,
                count: 500,
                wind: 0.0,
                base_color: Vec4::new(0.25, 0.3, 0.45, 1.0),
                tip_color: Vec4::new(0.8, 0.85, 0.95, 1.0),
                ..FieldConfig::default()
            }),
            subject: None,
        },
        "toon" => SceneConfig {
            name: name.into(),
            time_scale: 0.3,
            camera: CameraConfig {
                position: Vec3::new(2.0, 1.5, 2.0),
                ..CameraConfig::default()
            },
            sky: Some(SkyConfig::default()),
            field: None,
            subject: Some(SubjectConfig::default()),
        },
        other => return Err(SceneError::UnknownPreset(other.to_string())),
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for name in PRESET_NAMES {
            let config = preset(name).unwrap();
            assert_eq!(config.name, *name);
            config.validate().unwrap();
        }
    }

    #[test]
    fn unknown_preset_rejected() {
        let err = preset("castle").unwrap_err();
        assert!(matches!(err, SceneError::UnknownPreset(ref n) if n == "castle"));
    }

    #[test]
    fn sky_preset_matches_defaults() {
        let config = preset("sky").unwrap();
        let sky = config.sky.unwrap();
        assert_eq!(sky.elevation, 0.2);
        assert_eq!(sky.azimuth, 0.4);
        assert_eq!(sky.fog_fade, 0.005);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.position, Vec3::ONE);
    }

    #[test]
    fn wind_preset_runs_slow_time() {
        assert_eq!(preset("grass-wind").unwrap().time_scale, 0.3);
    }

    #[test]
    fn sample_scene_files_validate() {
        let samples = [
            include_str!("../../../scenes/sky-noon.yaml"),
            include_str!("../../../scenes/meadow-dusk.yaml"),
            include_str!("../../../scenes/toon-garden.yaml"),
        ];
        for source in samples {
            let config = SceneConfig::from_yaml_str(source).unwrap();
            assert!(!config.name.is_empty());
        }

        let garden = SceneConfig::from_yaml_str(samples[2]).unwrap();
        assert_eq!(garden.sky, Some(SkyConfig::default()));
        assert_eq!(garden.field.map(|f| f.mesh), Some(FieldMesh::Blade));
        assert!(garden.subject.is_some());
    }
}
