//! Vectorial floor shadows of furniture.
//!
//! Every light is joined to every vertex of an obstacle and the ray is
//! carried on to the floor. The hull of the resulting floor points is the
//! obstacle's shadow; the sum over obstacles, scaled by room area, is the
//! layout's shadow score.

use geo_types::Coord;
use nalgebra::Point3;

use crate::classify::is_structural;
use crate::geom::{hull_area, project_ray_to_floor, Point};
use crate::graph::{LightVertex, ObstacleVertex};
use crate::radiometry::{path_transmission, Surroundings};
use crate::settings::Settings;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::graph::{Element, Graph, LightType, ObstacleAttributes};

    fn light_at(x: f32, y: f32, z: f32) -> LightVertex {
        LightVertex::new(Point3::new(x, y, z), 300.0, 3000.0, LightType::Center)
    }

    fn unit_box() -> Vec<ObstacleVertex> {
        let mut corners = Vec::new();
        for &z in &[0.0, 1.0] {
            for &(x, y) in &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                corners.push(ObstacleVertex {
                    point: Point3::new(x, y, z),
                    attributes: ObstacleAttributes {
                        element_id: Some(3),
                        element_type: Some("table".to_string()),
                        ..Default::default()
                    },
                });
            }
        }
        corners
    }

    #[test]
    fn box_under_light_casts_bounded_shadow() {
        let settings = Settings::default();
        let corners = unit_box();
        let obstacles: Vec<_> = corners.iter().collect();
        let surroundings = Surroundings {
            blockers: obstacles.clone(),
            reflectors: vec![],
        };
        let area = total_shadow_area(&[light_at(0.5, 0.5, 2.5)], &obstacles, &surroundings, &settings);
        // larger than the footprint, smaller than the unscaled projection
        assert!(area > 1.0 && area < 2.78, "area: {}", area);
        assert!((area - 2.5697).abs() < 0.01, "area: {}", area);
    }

    #[test]
    fn box_without_id_casts_one_shadow() {
        let settings = Settings::default();
        let shadow_of = |element_id: Option<u64>| {
            let mut graph = Graph::new();
            graph.add_element_box(&Element {
                element_id,
                element_type: "Desk".to_string(),
                width: 1.0,
                length: 1.0,
                height: 0.8,
                ..Default::default()
            });
            let obstacles: Vec<&ObstacleVertex> = graph.obstacles().map(|(_, o)| o).collect();
            total_shadow_area(&[light_at(0.5, 0.5, 2.2)], &obstacles, &Surroundings::default(), &settings)
        };
        let tagged = shadow_of(Some(4));
        let anonymous = shadow_of(None);
        assert!(tagged > 1.0);
        assert!((tagged - anonymous).abs() < 1e-5, "{} vs {}", tagged, anonymous);
    }

    #[test]
    fn upward_rays_cast_nothing() {
        let settings = Settings::default();
        let vertex = Point3::new(0.0, 0.0, 1.0);
        let below = light_at(0.0, 0.0, 0.5);
        assert!(shadow_point(&below, &vertex, &Surroundings::default(), &settings).is_none());
    }

    #[test]
    fn point_obstacle_needs_three_floor_points() {
        let settings = Settings::default();
        let vertex = vec![Point3::new(1.0, 1.0, 0.5)];
        let one = obstacle_shadow_area(&[light_at(0.0, 0.0, 2.0)], &vertex, &Surroundings::default(), &settings);
        assert_eq!(one, 0.0);
    }

    #[test]
    fn dimensions_synthesize_a_box() {
        let vertex = ObstacleVertex {
            point: Point3::new(2.0, 2.0, 0.8),
            attributes: ObstacleAttributes {
                width: Some(1.0),
                length: Some(0.5),
                height: Some(1.2),
                ..Default::default()
            },
        };
        let corners = element_vertices(&[&vertex], 0.0);
        assert_eq!(corners.len(), 8);
        let lowest = corners.iter().map(|p| p.z).fold(f32::INFINITY, f32::min);
        assert_eq!(lowest, 0.0);
        assert!(corners.iter().all(|p| (p.x - 2.0).abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn empty_room_has_no_shadow() {
        let settings = Settings::default();
        let score = shadow_score(&[light_at(0.0, 0.0, 2.2)], &[], 20.0, &Surroundings::default(), &settings);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn score_is_capped_and_skips_structure() {
        let settings = Settings::default();
        let corners = unit_box();
        let obstacles: Vec<_> = corners.iter().collect();
        let lights = [light_at(0.5, 0.5, 2.5)];
        let score = shadow_score(&lights, &obstacles, 0.01, &Surroundings::default(), &settings);
        assert_eq!(score, settings.shadow_score_cap);

        let wall = ObstacleVertex {
            point: Point3::new(0.0, 0.0, 1.0),
            attributes: ObstacleAttributes {
                element_type: Some("wall".to_string()),
                width: Some(4.0),
                length: Some(0.2),
                height: Some(2.5),
                ..Default::default()
            },
        };
        let score = shadow_score(&lights, &[&wall], 20.0, &Surroundings::default(), &settings);
        assert_eq!(score, 0.0);
    }
}

/// Floor point of the shadow `light` casts past `vertex`, if the ray goes down.
///
/// The offset from the vertex to where the ray meets the floor is scaled by
/// the ray's cosine to the vertical and by the transmission from the vertex
/// down to the floor, and shrunk further when the light cannot reach the
/// vertex directly.
pub fn shadow_point(
    light: &LightVertex,
    vertex: &Point,
    surroundings: &Surroundings,
    settings: &Settings,
) -> Option<Coord<f32>> {
    let direction = vertex - light.point;
    let floor = project_ray_to_floor(&light.point, &direction, settings.floor_z)?;
    let length = direction.norm();
    if length < f32::EPSILON {
        return None;
    }

    let grazing = direction.z.abs() / length;
    let to_floor = path_transmission(vertex, &floor, &surroundings.blockers, settings);
    let blocked = path_transmission(&light.point, vertex, &surroundings.blockers, settings) <= 0.0;
    let mut scale = grazing * to_floor;
    if blocked {
        scale *= settings.blocked_shadow_factor;
    }

    Some(Coord {
        x: vertex.x + (floor.x - vertex.x) * scale,
        y: vertex.y + (floor.y - vertex.y) * scale,
    })
}

/// Shadow area of one obstacle: hull of every light's floor points.
pub fn obstacle_shadow_area(
    lights: &[LightVertex],
    vertices: &[Point],
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    let points: Vec<Coord<f32>> = lights
        .iter()
        .flat_map(|light| {
            vertices
                .iter()
                .filter_map(move |vertex| shadow_point(light, vertex, surroundings, settings))
        })
        .collect();
    if points.len() < 3 {
        return 0.0;
    }
    hull_area(&points)
}

/// Summed shadow area of the non-structural obstacles, one per element.
pub fn total_shadow_area(
    lights: &[LightVertex],
    obstacles: &[&ObstacleVertex],
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    group_by_element(obstacles)
        .iter()
        .map(|group| {
            let vertices = element_vertices(group, settings.floor_z);
            obstacle_shadow_area(lights, &vertices, surroundings, settings)
        })
        .sum()
}

/// Shadow area per room area, times ten, capped. Higher is worse.
pub fn shadow_score(
    lights: &[LightVertex],
    obstacles: &[&ObstacleVertex],
    room_area: f32,
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    if obstacles.is_empty() || lights.is_empty() {
        return 0.0;
    }
    let area = total_shadow_area(lights, obstacles, surroundings, settings);
    (10.0 * area / room_area.max(f32::EPSILON)).min(settings.shadow_score_cap)
}

/// Geometric vertices of one element. A lone vertex with dimensions stands
/// for the centre of the element's top face and is expanded into its box.
pub fn element_vertices(group: &[&ObstacleVertex], floor_z: f32) -> Vec<Point> {
    if let [single] = group {
        if let Some((w, l, h)) = single.attributes.dimensions() {
            let top = single.point;
            let bottom = (top.z - h).max(floor_z).min(top.z);
            let mut corners = Vec::with_capacity(8);
            for z in [bottom, top.z] {
                for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    corners.push(Point3::new(top.x + dx * w / 2.0, top.y + dy * l / 2.0, z));
                }
            }
            return corners;
        }
    }
    group.iter().map(|obstacle| obstacle.point).collect()
}

fn group_by_element<'a>(obstacles: &[&'a ObstacleVertex]) -> Vec<Vec<&'a ObstacleVertex>> {
    let mut groups: Vec<Vec<&ObstacleVertex>> = Vec::new();
    for &obstacle in obstacles {
        if is_structural(&obstacle.attributes) {
            continue;
        }
        let key = obstacle.attributes.element_key();
        let position = key.and_then(|key| {
            groups
                .iter()
                .position(|group| group[0].attributes.element_key() == Some(key))
        });
        match position {
            Some(index) => groups[index].push(obstacle),
            None => groups.push(vec![obstacle]),
        }
    }
    groups
}
