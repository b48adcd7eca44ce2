use std::collections::BTreeMap;
use std::fmt;

use glam::{Vec2, Vec3, Vec4};

/// Uniform names shared between scene materials and the shaders.
pub mod uniform {
    pub const TIME: &str = "u_time";
    pub const SUN_DIRECTION: &str = "u_sun_direction";
    pub const RESOLUTION: &str = "u_resolution";
    pub const FOG_FADE: &str = "u_fog_fade";
    pub const FOV: &str = "u_fov";
    pub const WIND: &str = "u_wind";
    pub const BASE_COLOR: &str = "u_base_color";
    pub const TIP_COLOR: &str = "u_tip_color";
    pub const COLOR: &str = "u_color";
    pub const RIM: &str = "u_rim";
}

/// Value of a named shader input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Vec2(v) => write!(f, "({:.3}, {:.3})", v.x, v.y),
            Self::Vec3(v) => write!(f, "({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
            Self::Vec4(v) => write!(f, "({:.3}, {:.3}, {:.3}, {:.3})", v.x, v.y, v.z, v.w),
        }
    }
}

/// A shader program's parameter block: named uniforms in a stable order.
///
/// Materials marked time-driven receive `u_time` from the frame loop each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    uniforms: BTreeMap<&'static str, UniformValue>,
    time_driven: bool,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uniforms: BTreeMap::new(),
            time_driven: false,
        }
    }

    /// Declare `u_time` on this material, starting at zero.
    pub fn time_driven(mut self) -> Self {
        self.time_driven = true;
        self.uniforms.insert(uniform::TIME, UniformValue::Float(0.0));
        self
    }

    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        self.uniforms.insert(name, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_time_driven(&self) -> bool {
        self.time_driven
    }

    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        self.uniforms.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name) {
            Some(UniformValue::Vec2(v)) => Some(v),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => Some(v),
            _ => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<Vec4> {
        match self.get(name) {
            Some(UniformValue::Vec4(v)) => Some(v),
            _ => None,
        }
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.uniforms.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_match_variant() {
        let m = Material::new("m")
            .with(uniform::FOG_FADE, UniformValue::Float(0.005))
            .with(uniform::SUN_DIRECTION, UniformValue::Vec3(Vec3::Y));
        assert_eq!(m.float(uniform::FOG_FADE), Some(0.005));
        assert_eq!(m.vec3(uniform::SUN_DIRECTION), Some(Vec3::Y));
        // Wrong type or missing name yields None
        assert_eq!(m.float(uniform::SUN_DIRECTION), None);
        assert_eq!(m.vec4("u_missing"), None);
    }

    #[test]
    fn time_driven_declares_time() {
        let m = Material::new("field").time_driven();
        assert!(m.is_time_driven());
        assert_eq!(m.float(uniform::TIME), Some(0.0));

        let plain = Material::new("sky");
        assert!(!plain.is_time_driven());
        assert_eq!(plain.get(uniform::TIME), None);
    }

    #[test]
    fn set_overwrites() {
        let mut m = Material::new("m").with(uniform::RIM, UniformValue::Float(1.0));
        m.set(uniform::RIM, UniformValue::Float(0.25));
        assert_eq!(m.float(uniform::RIM), Some(0.25));
        assert_eq!(m.uniforms().count(), 1);
    }

    #[test]
    fn display_formats_values() {
        assert_eq!(UniformValue::Float(3.0).to_string(), "3.0000");
        assert_eq!(
            UniformValue::Vec2(Vec2::new(1.0, 2.0)).to_string(),
            "(1.000, 2.000)"
        );
    }
}
