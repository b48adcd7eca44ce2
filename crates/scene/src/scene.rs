use glam::Vec2;

use crate::config::{CameraConfig, FieldConfig, FieldMesh, SceneConfig, SkyConfig, SubjectConfig};
use crate::error::SceneError;
use crate::material::{Material, UniformValue, uniform};
use crate::scatter::{FieldBounds, InstanceSet, scatter_seeded};

/// The scene's shader clock: `value = elapsed * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUniform {
    scale: f64,
    value: f32,
}

impl TimeUniform {
    pub fn new(scale: f32) -> Self {
        Self {
            scale: f64::from(scale),
            value: 0.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn update(&mut self, elapsed: f64) -> f32 {
        self.value = (elapsed * self.scale) as f32;
        self.value
    }
}

impl Default for TimeUniform {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Full-screen sky and sun background.
#[derive(Debug, Clone)]
pub struct SkyLayer {
    pub material: Material,
}

/// Instanced mesh scattered over the ground.
#[derive(Debug, Clone)]
pub struct FieldLayer {
    pub mesh: FieldMesh,
    pub ground: bool,
    pub material: Material,
    instances: InstanceSet,
}

impl FieldLayer {
    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }
}

/// Single toon-shaded object at the origin.
#[derive(Debug, Clone)]
pub struct SubjectLayer {
    pub material: Material,
}

/// A built scene: validated config turned into materials and instance data.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    camera: CameraConfig,
    time: TimeUniform,
    pub sky: Option<SkyLayer>,
    pub field: Option<FieldLayer>,
    pub subject: Option<SubjectLayer>,
}

impl Scene {
    /// Validate `config` and build every layer. Field instances are scattered
    /// here, once, from the configured seed.
    pub fn build(config: &SceneConfig) -> Result<Self, SceneError> {
        let _span = tracing::info_span!("scene_build", scene = %config.name).entered();
        config.validate()?;

        let sky = config.sky.as_ref().map(|sky| sky_layer(sky, &config.camera));
        let field = config.field.as_ref().map(field_layer);
        let subject = config.subject.as_ref().map(subject_layer);

        if let Some(field) = &field {
            tracing::debug!(
                mesh = field.mesh.as_str(),
                instances = field.instances.len(),
                "field scattered"
            );
        }

        Ok(Self {
            name: config.name.clone(),
            camera: config.camera,
            time: TimeUniform::new(config.time_scale),
            sky,
            field,
            subject,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial camera placement and projection.
    pub fn camera_config(&self) -> &CameraConfig {
        &self.camera
    }

    pub fn time(&self) -> TimeUniform {
        self.time
    }

    pub fn instance_count(&self) -> usize {
        self.field.as_ref().map_or(0, |f| f.instances.len())
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.sky
            .iter()
            .map(|l| &l.material)
            .chain(self.field.iter().map(|l| &l.material))
            .chain(self.subject.iter().map(|l| &l.material))
    }

    fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.sky
            .iter_mut()
            .map(|l| &mut l.material)
            .chain(self.field.iter_mut().map(|l| &mut l.material))
            .chain(self.subject.iter_mut().map(|l| &mut l.material))
    }

    /// Recompute the time uniform from `elapsed` seconds and write it into
    /// every time-driven material. Returns the new uniform value.
    pub fn apply_time(&mut self, elapsed: f64) -> f32 {
        let value = self.time.update(elapsed);
        for material in self.materials_mut().filter(|m| m.is_time_driven()) {
            material.set(uniform::TIME, UniformValue::Float(value));
        }
        value
    }

    /// Viewport size in physical pixels, read by the sky shader.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        if let Some(sky) = &mut self.sky {
            sky.material.set(
                uniform::RESOLUTION,
                UniformValue::Vec2(Vec2::new(width as f32, height as f32)),
            );
        }
    }

    /// Rewrite the sky uniforms from new sun angles and fog.
    pub fn set_sky(&mut self, sky: &SkyConfig) {
        if let Some(layer) = &mut self.sky {
            layer
                .material
                .set(uniform::SUN_DIRECTION, UniformValue::Vec3(sky.sun_direction()));
            layer
                .material
                .set(uniform::FOG_FADE, UniformValue::Float(sky.fog_fade));
        }
    }
}

fn sky_layer(sky: &SkyConfig, camera: &CameraConfig) -> SkyLayer {
    let material = Material::new("sky")
        .with(uniform::SUN_DIRECTION, UniformValue::Vec3(sky.sun_direction()))
        .with(uniform::RESOLUTION, UniformValue::Vec2(Vec2::ONE))
        .with(uniform::FOG_FADE, UniformValue::Float(sky.fog_fade))
        .with(uniform::FOV, UniformValue::Float(camera.fov_degrees));
    SkyLayer { material }
}

fn field_layer(field: &FieldConfig) -> FieldLayer {
    let bounds = FieldBounds::new(field.width, field.depth);
    let instances = scatter_seeded(field.count as usize, bounds, field.seed);
    let material = Material::new(field.mesh.as_str())
        .time_driven()
        .with(uniform::WIND, UniformValue::Float(field.wind))
        .with(uniform::BASE_COLOR, UniformValue::Vec4(field.base_color))
        .with(uniform::TIP_COLOR, UniformValue::Vec4(field.tip_color));
    FieldLayer {
        mesh: field.mesh,
        ground: field.ground,
        material,
        instances,
    }
}

fn subject_layer(subject: &SubjectConfig) -> SubjectLayer {
    let mut material = Material::new("subject")
        .with(uniform::COLOR, UniformValue::Vec4(subject.color))
        .with(uniform::RIM, UniformValue::Float(subject.rim));
    if subject.spin {
        material = material.time_driven();
    } else {
        material.set(uniform::TIME, UniformValue::Float(0.0));
    }
    SubjectLayer { material }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::preset;

    #[test]
    fn time_uniform_scales_elapsed() {
        let mut t = TimeUniform::new(0.3);
        let v = t.update(10.0);
        assert!((v - 3.0).abs() < 1e-5);
        assert_eq!(t.value(), v);

        let mut unit = TimeUniform::default();
        assert_eq!(unit.update(2.5), 2.5);
    }

    #[test]
    fn apply_time_reaches_only_time_driven_materials() {
        let mut config = preset("grass").unwrap();
        config.time_scale = 0.3;
        let mut scene = Scene::build(&config).unwrap();

        let value = scene.apply_time(10.0);
        assert!((value - 3.0).abs() < 1e-5);

        let field = scene.field.as_ref().unwrap();
        assert_eq!(field.material.float(uniform::TIME), Some(value));
        let sky = scene.sky.as_ref().unwrap();
        assert_eq!(sky.material.get(uniform::TIME), None);
    }

    #[test]
    fn field_built_once_with_configured_count() {
        let scene = Scene::build(&preset("planes").unwrap()).unwrap();
        let field = scene.field.as_ref().unwrap();
        assert_eq!(field.mesh, FieldMesh::Plane);
        assert_eq!(scene.instance_count(), 500);
        assert!(field
            .instances()
            .iter()
            .all(|t| field.instances().bounds().contains(t.position)));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let config = preset("grass").unwrap();
        let a = Scene::build(&config).unwrap();
        let b = Scene::build(&config).unwrap();
        assert_eq!(
            a.field.as_ref().unwrap().instances(),
            b.field.as_ref().unwrap().instances()
        );
    }

    #[test]
    fn invalid_config_fails_build() {
        let mut config = preset("sky").unwrap();
        config.camera.far = 0.0;
        assert!(Scene::build(&config).is_err());
    }

    #[test]
    fn sky_uniforms_follow_resize_and_sun() {
        let mut scene = Scene::build(&preset("sky").unwrap()).unwrap();
        scene.set_resolution(1280, 720);
        let sky = &scene.sky.as_ref().unwrap().material;
        assert_eq!(sky.vec2(uniform::RESOLUTION), Some(Vec2::new(1280.0, 720.0)));
        assert_eq!(sky.float(uniform::FOV), Some(75.0));

        let noon = SkyConfig {
            elevation: std::f32::consts::FRAC_PI_2,
            azimuth: 0.0,
            fog_fade: 0.01,
        };
        scene.set_sky(&noon);
        let sky = &scene.sky.as_ref().unwrap().material;
        let dir = sky.vec3(uniform::SUN_DIRECTION).unwrap();
        assert!((dir.y - 1.0).abs() < 1e-6);
        assert_eq!(sky.float(uniform::FOG_FADE), Some(0.01));
    }

    #[test]
    fn still_subject_keeps_time_at_zero() {
        let mut config = preset("toon").unwrap();
        if let Some(subject) = &mut config.subject {
            subject.spin = false;
        }
        let mut scene = Scene::build(&config).unwrap();
        scene.apply_time(5.0);
        let subject = &scene.subject.as_ref().unwrap().material;
        assert_eq!(subject.float(uniform::TIME), Some(0.0));
        assert!(!subject.is_time_driven());
    }

    #[test]
    fn materials_iterate_in_layer_order() {
        let scene = Scene::build(&preset("grass").unwrap()).unwrap();
        let names: Vec<&str> = scene.materials().map(Material::name).collect();
        assert_eq!(names, ["sky", "blade"]);
    }
}
