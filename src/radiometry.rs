//! Illuminance from point sources, with one diffuse bounce and transmission
//! through clear media.

use std::f32::consts::PI;

use crate::classify::Classification;
use crate::config;
use crate::fresnel;
use crate::geom::{distance_3d, horizontal_cosine, line_intersects_obstacle, Point, Vector};
use crate::graph::{Graph, LightVertex, ObstacleVertex, VertexId};
use crate::material::{find_medium, TransparentMedium};
use crate::settings::Settings;
use crate::snell;


/// Obstacles that can block light paths and surfaces that bounce light.
#[derive(Debug, Clone, Default)]
pub struct Surroundings<'a> {
    pub blockers: Vec<&'a ObstacleVertex>,
    pub reflectors: Vec<&'a ObstacleVertex>,
}

impl<'a> Surroundings<'a> {
    pub fn new(graph: &'a Graph, classes: &Classification) -> Self {
        let resolve = |ids: &[VertexId]| -> Vec<&'a ObstacleVertex> {
            ids.iter()
                .filter_map(|&id| graph.get(id).and_then(|v| v.as_obstacle()))
                .collect()
        };
        Self {
            blockers: resolve(&classes.obstacles),
            reflectors: resolve(&classes.reflective),
        }
    }
}

/// Exponential attenuation over `distance` metres of air.
pub fn air_attenuation(distance: f32, extinction: f32) -> f32 {
    (-extinction * distance).exp()
}

/// Direct illuminance (lux) at `point` on a horizontal surface.
///
/// `E = Φ/(4π) · cosθ · T · exp(-k d) / d²`, with `d` floored at the
/// distance epsilon and near-grazing light (`cosθ` below the threshold)
/// contributing nothing.
pub fn direct_illuminance(light: &LightVertex, point: &Point, transmission: f32, settings: &Settings) -> f32 {
    let cos_theta = horizontal_cosine(&light.point, point);
    if cos_theta < settings.cosine_threshold || transmission <= 0.0 {
        return 0.0;
    }
    let d = distance_3d(&light.point, point).max(settings.distance_epsilon);
    light.lumens / (4.0 * PI) * cos_theta * transmission * air_attenuation(d, settings.air_extinction) / (d * d)
}

/// Single diffuse bounce off every reflector above the reflection threshold.
/// Legs with a zero cosine or no transmission are skipped.
pub fn reflected_illuminance(
    light: &LightVertex,
    point: &Point,
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    let mut total = 0.0;

    for reflector in &surroundings.reflectors {
        let rho = reflector.attributes.reflection_factor;
        if rho <= settings.reflection_threshold {
            continue;
        }
        let normal = surface_normal(reflector);
        let to_light = light.point - reflector.point;
        let to_point = point - reflector.point;
        let (d1, d2) = (to_light.norm(), to_point.norm());
        if d1 < f32::EPSILON || d2 < f32::EPSILON {
            continue;
        }

        let cos_in = (to_light.dot(&normal) / d1).abs();
        let cos_out = (to_point.dot(&normal) / d2).abs();
        if cos_in < f32::EPSILON || cos_out < f32::EPSILON {
            continue;
        }

        let t_in = path_transmission(&light.point, &reflector.point, &surroundings.blockers, settings);
        if t_in <= 0.0 {
            continue;
        }
        let t_out = path_transmission(&reflector.point, point, &surroundings.blockers, settings);
        if t_out <= 0.0 {
            continue;
        }

        let d1 = d1.max(settings.distance_epsilon);
        let d2 = d2.max(settings.distance_epsilon);
        let incident =
            light.lumens / (4.0 * PI) * cos_in * t_in * air_attenuation(d1, settings.air_extinction) / (d1 * d1);
        total += incident * rho * cos_out * t_out * air_attenuation(d2, settings.air_extinction) / (PI * d2 * d2);
    }

    total
}

/// Direct plus reflected illuminance at `point` from every light.
pub fn illuminance_at<'a>(
    point: &Point,
    lights: impl IntoIterator<Item = &'a LightVertex>,
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    lights
        .into_iter()
        .map(|light| {
            let transmission = path_transmission(&light.point, point, &surroundings.blockers, settings);
            direct_illuminance(light, point, transmission, settings)
                + reflected_illuminance(light, point, surroundings, settings)
        })
        .sum()
}

/// Fraction of light getting from `start` to `end` past the blockers.
///
/// Each intersected obstacle multiplies in its own transmission; opaque
/// ones give zero. Below the transmission cutoff the path is blocked.
/// With occlusion disabled every path is clear.
pub fn path_transmission(start: &Point, end: &Point, blockers: &[&ObstacleVertex], settings: &Settings) -> f32 {
    if !settings.occlusion {
        return 1.0;
    }
    let mut transmission = 1.0;
    for blocker in blockers {
        if !line_intersects_obstacle(start, end, &blocker.point, settings.blocking_radius) {
            continue;
        }
        transmission *= obstacle_transmission(start, end, blocker, settings);
        if transmission < settings.transmission_cutoff {
            return 0.0;
        }
    }
    transmission
}

/// Transmission of one obstacle crossed by the segment, zero unless its
/// material or type names a clear medium.
pub fn obstacle_transmission(start: &Point, end: &Point, obstacle: &ObstacleVertex, settings: &Settings) -> f32 {
    let Some(medium) = find_medium(&settings.media, &obstacle.attributes.descriptor()) else {
        return 0.0;
    };
    let thickness = obstacle
        .attributes
        .thickness
        .into_iter()
        .chain([medium.default_thickness])
        .find(|t| *t > 0.0)
        .unwrap_or(config::DEFAULT_THICKNESS);
    slab_transmission(
        &(end - start),
        &surface_normal(obstacle),
        medium,
        thickness,
        settings.medium_refr_index,
    )
}

/// Power transmitted through a flat slab of `medium` surrounded by a medium
/// of index `n_outside`: Fresnel losses at both faces and Beer-Lambert
/// absorption along the refracted path `thickness / cos θt`.
pub fn slab_transmission(
    direction: &Vector,
    normal: &Vector,
    medium: &TransparentMedium,
    thickness: f32,
    n_outside: f32,
) -> f32 {
    let length = direction.norm();
    if length < f32::EPSILON {
        return 0.0;
    }
    let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector::z);
    let cos_i = (direction.dot(&normal) / length).abs().min(1.0);
    let theta_i = cos_i.acos();
    let n_inside = medium.refractive_index;

    let Some(theta_t) = snell::get_theta_t(theta_i, n_outside, n_inside) else {
        return 0.0;
    };
    let entry = interface_transmission(theta_i, n_outside, n_inside);
    let exit = interface_transmission(theta_t, n_inside, n_outside);
    let path = thickness / theta_t.cos().max(f32::EPSILON);

    entry * exit * (-medium.absorption * path).exp()
}

/// Fresnel power transmittance at one interface, zero on total internal
/// reflection or at grazing incidence.
pub fn interface_transmission(theta_i: f32, n1: f32, n2: f32) -> f32 {
    if theta_i.cos() < f32::EPSILON {
        return 0.0;
    }
    match snell::get_theta_t(theta_i, n1, n2) {
        Some(theta_t) => fresnel::transmittance(n1, n2, theta_i, theta_t).clamp(0.0, 1.0),
        None => 0.0,
    }
}

fn surface_normal(obstacle: &ObstacleVertex) -> Vector {
    obstacle
        .attributes
        .normal
        .and_then(|n| n.try_normalize(f32::EPSILON))
        .unwrap_or_else(Vector::z)
}
