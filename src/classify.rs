//! Splits a room graph into the entities the optimizer works with.
//!
//! Classification only reads the graph, so running it again on the same
//! graph gives the same partition.

use std::collections::BTreeMap;

use crate::geom::{centroid, distance_3d, Point};
use crate::graph::{ElementKey, Graph, ObstacleAttributes, VertexId};
use crate::room::{assign_room, Room};
use crate::settings::Settings;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::graph::{Element, LightType, LightVertex, ObstacleVertex, Vertex};
    use nalgebra::{Point2, Point3};

    fn plain_obstacle(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::Obstacle(ObstacleVertex {
            point: Point3::new(x, y, z),
            attributes: ObstacleAttributes::default(),
        })
    }

    fn furnished_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex(Vertex::Light(LightVertex::new(
            Point3::new(2.0, 2.0, 2.4),
            300.0,
            3000.0,
            LightType::Center,
        )));
        graph.add_vertex(Vertex::Light(LightVertex::new(
            Point3::new(0.5, 0.5, 1.3),
            450.0,
            800.0,
            LightType::Furniture,
        )));
        graph.add_element_box(&Element {
            element_id: Some(1),
            element_type: "Desk".to_string(),
            origin: Point3::new(0.0, 0.0, 0.0),
            width: 1.0,
            length: 1.0,
            height: 0.8,
            material: Some("mirror".to_string()),
            reflection_range: 0.0,
            ..Default::default()
        });
        graph.add_element_box(&Element {
            element_id: Some(2),
            element_type: "Cabinet".to_string(),
            origin: Point3::new(3.0, 3.0, 0.0),
            width: 0.5,
            length: 0.5,
            height: 2.0,
            ..Default::default()
        });
        graph
    }

    #[test]
    fn lights_split_by_tag() {
        let graph = furnished_graph();
        let classes = classify(&graph, &Settings::default());
        assert_eq!(classes.center_lights.len(), 1);
        assert_eq!(classes.furniture_lights.len(), 1);
        assert_eq!(classes.obstacles.len(), 16);
        // only the mirrored desk is reflective
        assert_eq!(classes.reflective.len(), 8);
    }

    #[test]
    fn desk_is_one_task_target() {
        let graph = furnished_graph();
        let classes = classify(&graph, &Settings::default());
        assert_eq!(classes.task_furniture.len(), 1);
        let desk = &classes.task_furniture[0];
        assert_eq!(desk.element_id, Some(1));
        assert_eq!(desk.required_lux, 0.0);
        assert!((desk.point.x - 0.5).abs() < 1e-6 && (desk.point.y - 0.5).abs() < 1e-6);
        assert!((desk.point.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn desk_without_id_is_one_task_target() {
        let mut graph = Graph::new();
        graph.add_element_box(&Element {
            element_type: "Desk".to_string(),
            width: 1.0,
            length: 1.0,
            height: 0.8,
            ..Default::default()
        });
        let classes = classify(&graph, &Settings::default());
        assert_eq!(classes.task_furniture.len(), 1);
        let desk = &classes.task_furniture[0];
        assert_eq!(desk.element_id, None);
        assert!((desk.point.x - 0.5).abs() < 1e-6 && (desk.point.y - 0.5).abs() < 1e-6);
        assert!((desk.point.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn classification_is_idempotent() {
        let graph = furnished_graph();
        let settings = Settings::default();
        let first = classify(&graph, &settings);
        let second = classify(&graph, &settings);
        assert_eq!(first, second);

        let total = first.center_lights.len() + first.furniture_lights.len() + first.obstacles.len();
        assert_eq!(total, graph.len());
    }

    #[test]
    fn short_edges_cluster_untagged_furniture() {
        let mut graph = Graph::new();
        let corners: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| graph.add_vertex(plain_obstacle(x, y, 0.7)))
            .collect();
        for i in 0..4 {
            graph.add_edge(corners[i], corners[(i + 1) % 4], 0.0, 1.0);
        }
        // a pair joined by a long edge is not furniture
        let a = graph.add_vertex(plain_obstacle(5.0, 5.0, 0.0));
        let b = graph.add_vertex(plain_obstacle(8.0, 5.0, 0.0));
        graph.add_edge(a, b, 0.0, 3.0);

        let classes = classify(&graph, &Settings::default());
        assert_eq!(classes.task_furniture.len(), 1);
        assert!(corners.contains(&classes.task_furniture[0].vertex));
    }

    #[test]
    fn disjoint_set_groups_in_order() {
        let mut sets = DisjointSet::new(5);
        sets.union(3, 4);
        sets.union(0, 2);
        assert_eq!(sets.groups(), vec![vec![0, 2], vec![1], vec![3, 4]]);
    }

    #[test]
    fn room_filter_uses_assignment() {
        let graph = furnished_graph();
        let settings = Settings::default();
        let rooms = vec![
            Room::new("near", Point2::new(1.0, 1.0)),
            Room::new("far", Point2::new(30.0, 30.0)),
        ];
        let classes = classify(&graph, &settings);
        let near = classes.for_room(&graph, &rooms, "near");
        assert_eq!(near.center_lights.len(), 1);
        assert_eq!(near.task_furniture.len(), 1);
        let far = classes.for_room(&graph, &rooms, "far");
        assert!(far.center_lights.is_empty() && far.obstacles.is_empty());
    }

    #[test]
    fn keyword_helpers() {
        assert!(is_task_furniture("Office DESK"));
        assert!(!is_task_furniture("wardrobe"));
        assert_eq!(task_lux_multiplier("workbench"), 1.5);
        assert_eq!(task_lux_multiplier("corner sofa"), 0.8);
        assert_eq!(task_lux_multiplier("dining table"), 1.0);
    }
}

/// Element keywords marking furniture that needs task lighting.
pub const FURNITURE_KEYWORDS: [&str; 7] = [
    "desk", "table", "counter", "workbench", "sofa", "couch", "stage",
];

/// Height band (m) below the highest vertex that counts as the top face.
const TOP_FACE_TOLERANCE: f32 = 0.01;

const STRUCTURAL_KEYWORDS: [&str; 6] = ["wall", "slab", "floor", "ceiling", "roof", "column"];

pub fn is_task_furniture(descriptor: &str) -> bool {
    let descriptor = descriptor.to_lowercase();
    FURNITURE_KEYWORDS.iter().any(|kw| descriptor.contains(kw))
}

/// Scales a room's recommended lux for the task over a piece of furniture.
pub fn task_lux_multiplier(descriptor: &str) -> f32 {
    let descriptor = descriptor.to_lowercase();
    if ["desk", "workbench"].iter().any(|kw| descriptor.contains(kw)) {
        1.5
    } else if ["sofa", "couch"].iter().any(|kw| descriptor.contains(kw)) {
        0.8
    } else {
        1.0
    }
}

pub fn is_wall(attributes: &ObstacleAttributes) -> bool {
    attributes
        .element_type
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains("wall"))
}

/// Building structure: casts no furniture shadow and needs no task light.
pub fn is_structural(attributes: &ObstacleAttributes) -> bool {
    attributes.element_type.as_deref().is_some_and(|t| {
        let t = t.to_lowercase();
        STRUCTURAL_KEYWORDS.iter().any(|kw| t.contains(kw))
    })
}

/// Union-find over `0..n` with path halving.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    /// Members of every set, each sorted, ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            groups.entry(root).or_default().push(i);
        }
        groups.into_values().collect()
    }
}

/// A piece of furniture to light, represented by one of its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTarget {
    pub vertex: VertexId,
    /// Centre of the group's top face.
    pub point: Point,
    pub element_id: Option<u64>,
    /// Zero when the element does not say; the room's lux applies then.
    pub required_lux: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub center_lights: Vec<VertexId>,
    pub furniture_lights: Vec<VertexId>,
    pub obstacles: Vec<VertexId>,
    pub reflective: Vec<VertexId>,
    pub task_furniture: Vec<TaskTarget>,
}

/// Partitions the graph's lights and obstacles.
///
/// Task furniture is found by `required_lux > 0` or a furniture keyword,
/// grouped per element. When no vertex carries either signal, obstacles
/// joined by edges shorter than `cluster_edge_length` are grouped instead,
/// and groups of at least `cluster_min_size` vertices count as furniture.
pub fn classify(graph: &Graph, settings: &Settings) -> Classification {
    let mut classes = Classification::default();

    for (id, light) in graph.lights() {
        if light.is_center() {
            classes.center_lights.push(id);
        } else {
            classes.furniture_lights.push(id);
        }
    }

    let mut flagged: Vec<VertexId> = Vec::new();
    for (id, obstacle) in graph.obstacles() {
        classes.obstacles.push(id);
        let attributes = &obstacle.attributes;
        if attributes.reflection_factor > settings.reflection_threshold {
            classes.reflective.push(id);
        }
        if is_structural(attributes) {
            continue;
        }
        if attributes.required_lux > 0.0 || is_task_furniture(&attributes.descriptor()) {
            flagged.push(id);
        }
    }

    classes.task_furniture = if flagged.is_empty() {
        cluster_furniture(graph, &classes.obstacles, settings)
    } else {
        group_by_element(graph, &flagged)
    };

    classes
}

fn group_by_element(graph: &Graph, flagged: &[VertexId]) -> Vec<TaskTarget> {
    // vertices with neither an element id nor a box group stand alone
    let mut groups: Vec<(Option<ElementKey>, Vec<VertexId>)> = Vec::new();
    for &id in flagged {
        let key = graph
            .get(id)
            .and_then(|v| v.as_obstacle())
            .and_then(|o| o.attributes.element_key());
        match groups
            .iter_mut()
            .find(|(other, _)| key.is_some() && *other == key)
        {
            Some((_, members)) => members.push(id),
            None => groups.push((key, vec![id])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| {
            let element_id = match key {
                Some(ElementKey::Id(id)) => Some(id),
                _ => None,
            };
            representative(graph, &members, element_id)
        })
        .collect()
}

fn cluster_furniture(graph: &Graph, obstacles: &[VertexId], settings: &Settings) -> Vec<TaskTarget> {
    let candidates: Vec<VertexId> = obstacles
        .iter()
        .copied()
        .filter(|&id| {
            graph
                .get(id)
                .and_then(|v| v.as_obstacle())
                .is_some_and(|o| !is_structural(&o.attributes))
        })
        .collect();
    let position = |id: VertexId| candidates.iter().position(|&c| c == id);

    let mut sets = DisjointSet::new(candidates.len());
    for edge in graph.edges() {
        let (Some(a), Some(b)) = (position(edge.start), position(edge.end)) else {
            continue;
        };
        let length = match (graph.get(edge.start), graph.get(edge.end)) {
            _ if edge.length > 0.0 => edge.length,
            (Some(start), Some(end)) => distance_3d(start.point(), end.point()),
            _ => continue,
        };
        if length < settings.cluster_edge_length {
            sets.union(a, b);
        }
    }

    sets.groups()
        .into_iter()
        .filter(|group| group.len() >= settings.cluster_min_size)
        .filter_map(|group| {
            let members: Vec<VertexId> = group.iter().map(|&i| candidates[i]).collect();
            representative(graph, &members, None)
        })
        .collect()
}

/// The member nearest the group's centroid stands for the group. Light is
/// evaluated at the centre of the group's top face, where the task happens.
fn representative(graph: &Graph, members: &[VertexId], element_id: Option<u64>) -> Option<TaskTarget> {
    let vertices: Vec<(VertexId, Point, f32)> = members
        .iter()
        .filter_map(|&id| {
            let obstacle = graph.get(id)?.as_obstacle()?;
            Some((id, obstacle.point, obstacle.attributes.required_lux))
        })
        .collect();
    let points: Vec<Point> = vertices.iter().map(|(_, p, _)| *p).collect();
    let center = centroid(&points)?;

    let (vertex, _, _) = vertices
        .iter()
        .min_by(|a, b| distance_3d(&a.1, &center).total_cmp(&distance_3d(&b.1, &center)))?;

    let top = points.iter().map(|p| p.z).fold(f32::NEG_INFINITY, f32::max);
    let top_face: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| top - p.z < TOP_FACE_TOLERANCE)
        .collect();
    let point = centroid(&top_face)?;
    let required_lux = vertices.iter().map(|(_, _, lux)| *lux).fold(0.0, f32::max);

    Some(TaskTarget {
        vertex: *vertex,
        point,
        element_id,
        required_lux,
    })
}

impl Classification {
    /// Keeps only the entities assigned to `room_id`: an explicit room tag
    /// wins, otherwise the nearest room centre.
    pub fn for_room(&self, graph: &Graph, rooms: &[Room], room_id: &str) -> Classification {
        let in_room = |id: &VertexId| -> bool {
            let Some(vertex) = graph.get(*id) else {
                return false;
            };
            let tag = match (vertex.as_light(), vertex.as_obstacle()) {
                (Some(light), _) => light.room_id.as_deref(),
                (_, Some(obstacle)) => obstacle.attributes.room_id.as_deref(),
                _ => None,
            };
            assign_room(rooms, tag, vertex.point()).is_some_and(|room| room.id == room_id)
        };
        let keep = |ids: &[VertexId]| -> Vec<VertexId> {
            ids.iter().copied().filter(|id| in_room(id)).collect()
        };

        Classification {
            center_lights: keep(&self.center_lights),
            furniture_lights: keep(&self.furniture_lights),
            obstacles: keep(&self.obstacles),
            reflective: keep(&self.reflective),
            task_furniture: self
                .task_furniture
                .iter()
                .filter(|target| in_room(&target.vertex))
                .cloned()
                .collect(),
        }
    }
}
