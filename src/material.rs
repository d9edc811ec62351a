//! Surface materials: diffuse reflection factors and clear media.

use serde::{Deserialize, Serialize};


/// Diffuse reflection classes, ordered from most to least reflective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Mirror,
    Glass,
    Metal,
    GlossyPaint,
    Ceramic,
    WoodVarnished,
    LightColor,
    Wood,
    Concrete,
    DarkColor,
    Fabric,
    Black,
    Unknown,
}

impl Material {
    pub const ALL: [Material; 13] = [
        Material::Mirror,
        Material::Glass,
        Material::Metal,
        Material::GlossyPaint,
        Material::Ceramic,
        Material::WoodVarnished,
        Material::LightColor,
        Material::Wood,
        Material::Concrete,
        Material::DarkColor,
        Material::Fabric,
        Material::Black,
        Material::Unknown,
    ];

    pub fn reflection_factor(&self) -> f32 {
        match self {
            Material::Mirror => 0.9,
            Material::Glass => 0.8,
            Material::Metal => 0.7,
            Material::GlossyPaint => 0.6,
            Material::Ceramic => 0.5,
            Material::WoodVarnished => 0.4,
            Material::LightColor => 0.3,
            Material::Wood => 0.2,
            Material::Concrete => 0.15,
            Material::DarkColor => 0.1,
            Material::Fabric => 0.05,
            Material::Black => 0.03,
            Material::Unknown => 0.0,
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Material::Mirror => &["mirror"],
            Material::Glass => &["glass"],
            Material::Metal => &["metal", "steel", "aluminium", "aluminum"],
            Material::GlossyPaint => &["glossy", "gloss"],
            Material::Ceramic => &["ceramic", "tile", "porcelain"],
            Material::WoodVarnished => &["varnish", "polish"],
            Material::LightColor => &["white", "light", "cream"],
            Material::Wood => &["wood", "timber", "plywood"],
            Material::Concrete => &["concrete", "cement"],
            Material::DarkColor => &["dark", "grey", "gray"],
            Material::Fabric => &["fabric", "textile", "cloth", "cotton"],
            Material::Black => &["black"],
            Material::Unknown => &[],
        }
    }

    /// Classifies a free-text material name. The first class with a matching
    /// keyword wins; nothing matching gives [`Material::Unknown`].
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|material| material.keywords().iter().any(|kw| name.contains(kw)))
            .unwrap_or(Material::Unknown)
    }
}

/// Optical properties of a clear medium light can pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparentMedium {
    /// Matched against material names and element types, lowercase.
    pub keyword: String,
    pub refractive_index: f32,
    /// Beer-Lambert absorption coefficient (1/m).
    pub absorption: f32,
    /// Slab thickness (m) used when the element does not give one.
    pub default_thickness: f32,
}

impl TransparentMedium {
    fn new(keyword: &str, refractive_index: f32, absorption: f32, default_thickness: f32) -> Self {
        Self {
            keyword: keyword.to_string(),
            refractive_index,
            absorption,
            default_thickness,
        }
    }

    pub fn defaults() -> Vec<TransparentMedium> {
        vec![
            Self::new("window", 1.52, 4.0, 0.01),
            Self::new("glass", 1.52, 4.0, 0.006),
            Self::new("water", 1.33, 2.0, 0.1),
            Self::new("plastic", 1.49, 8.0, 0.005),
        ]
    }
}

/// Finds the first medium whose keyword occurs in `name`.
pub fn find_medium<'a>(media: &'a [TransparentMedium], name: &str) -> Option<&'a TransparentMedium> {
    let name = name.to_lowercase();
    media.iter().find(|medium| name.contains(&medium.keyword))
}
