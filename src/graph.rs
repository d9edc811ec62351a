//! The room graph: lights, obstacles and plain vertices joined by edges.
//!
//! Vertices live in an arena keyed by [`VertexId`]; edges hold ids, so a
//! vertex can be replaced in place without touching the edge list. Removing a
//! vertex drops every edge that referenced it. [`IndexedGraph`] is the flat,
//! position-indexed form used at the boundary with other tools.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::classify;
use crate::config;
use crate::geom::{Point, Vector};
use crate::material::Material;


new_key_type! {
    /// Stable handle of a vertex in a [`Graph`].
    pub struct VertexId;
}

/// Role of a light in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightType {
    /// General room lighting, owned by the optimizer.
    #[default]
    Center,
    /// Task light over a piece of furniture, never moved by the optimizer.
    Furniture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightVertex {
    pub point: Point,
    /// Illuminance target (lux).
    pub lux: f32,
    /// Total luminous flux (lm).
    pub lumens: f32,
    /// Element this light serves, if any.
    #[serde(default)]
    pub target_id: Option<u64>,
    #[serde(default)]
    pub light_type: LightType,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl LightVertex {
    pub fn new(point: Point, lux: f32, lumens: f32, light_type: LightType) -> Self {
        Self {
            point,
            lux,
            lumens: lumens.max(0.0),
            target_id: None,
            light_type,
            room_id: None,
        }
    }

    pub fn with_room(mut self, room_id: Option<String>) -> Self {
        self.room_id = room_id;
        self
    }

    pub fn is_center(&self) -> bool {
        self.light_type == LightType::Center
    }
}

/// Optional attributes of an obstacle vertex. Absent values are resolved by
/// the consumer: unknown reflection is 0, unknown required lux is the room's
/// recommendation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleAttributes {
    pub element_id: Option<u64>,
    pub reflection_factor: f32,
    pub required_lux: f32,
    pub material: Option<String>,
    /// Slab thickness (m) for transparent elements.
    pub thickness: Option<f32>,
    pub element_type: Option<String>,
    pub width: Option<f32>,
    pub length: Option<f32>,
    pub height: Option<f32>,
    pub room_id: Option<String>,
    /// Surface normal used for refraction, vertical when absent.
    pub normal: Option<Vector>,
    /// Box this vertex was built into by [`Graph::add_element_box`].
    pub group: Option<u64>,
}

/// Identifies the element an obstacle vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    Id(u64),
    Group(u64),
}

impl ObstacleAttributes {
    /// Material name and element type joined for keyword matching.
    pub fn descriptor(&self) -> String {
        let material = self.material.as_deref().unwrap_or_default();
        let element_type = self.element_type.as_deref().unwrap_or_default();
        format!("{} {}", material, element_type).to_lowercase()
    }

    /// The element id when known, else the box group.
    pub fn element_key(&self) -> Option<ElementKey> {
        self.element_id
            .map(ElementKey::Id)
            .or(self.group.map(ElementKey::Group))
    }

    pub fn dimensions(&self) -> Option<(f32, f32, f32)> {
        match (self.width, self.length, self.height) {
            (Some(w), Some(l), Some(h)) if w > 0.0 && l > 0.0 => Some((w, l, h.max(0.0))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleVertex {
    pub point: Point,
    #[serde(default)]
    pub attributes: ObstacleAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Vertex {
    Plain { point: Point },
    Light(LightVertex),
    Obstacle(ObstacleVertex),
}

impl Vertex {
    pub fn point(&self) -> &Point {
        match self {
            Vertex::Plain { point } => point,
            Vertex::Light(light) => &light.point,
            Vertex::Obstacle(obstacle) => &obstacle.point,
        }
    }

    pub fn as_light(&self) -> Option<&LightVertex> {
        match self {
            Vertex::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&ObstacleVertex> {
        match self {
            Vertex::Obstacle(obstacle) => Some(obstacle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: VertexId,
    pub end: VertexId,
    pub weight: f32,
    pub length: f32,
}

/// Edge of an [`IndexedGraph`], referencing vertices by position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexedEdge {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub length: f32,
}

/// Flat form of a [`Graph`]: an ordered vertex list and index-based edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexedGraph {
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<IndexedEdge>,
    #[serde(default)]
    pub center: Option<Point>,
}

/// A building element described by its minimum corner and box dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub element_id: Option<u64>,
    pub element_type: String,
    pub name: String,
    pub origin: Point,
    pub width: f32,
    pub length: f32,
    pub height: f32,
    pub material: Option<String>,
    /// Overrides the factor derived from `material`.
    pub reflection_factor: Option<f32>,
    /// Reach (m) of the reflection influence chain.
    pub reflection_range: f32,
    pub required_lux: f32,
    pub thickness: Option<f32>,
    pub room_id: Option<String>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            element_id: None,
            element_type: String::new(),
            name: String::new(),
            origin: Point3::origin(),
            width: 0.0,
            length: 0.0,
            height: 0.0,
            material: None,
            reflection_factor: None,
            reflection_range: 1.0,
            required_lux: 0.0,
            thickness: None,
            room_id: None,
        }
    }
}

impl Element {
    pub fn reflection_factor(&self) -> f32 {
        self.reflection_factor
            .unwrap_or_else(|| {
                self.material
                    .as_deref()
                    .map(|m| Material::from_name(m).reflection_factor())
                    .unwrap_or(0.0)
            })
            .clamp(0.0, 1.0)
    }

    fn attributes(&self) -> ObstacleAttributes {
        ObstacleAttributes {
            element_id: self.element_id,
            reflection_factor: self.reflection_factor(),
            required_lux: self.required_lux,
            material: self.material.clone(),
            thickness: self.thickness,
            element_type: Some(self.element_type.clone()),
            width: Some(self.width),
            length: Some(self.length),
            height: Some(self.height),
            room_id: self.room_id.clone(),
            normal: None,
            group: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: SlotMap<VertexId, Vertex>,
    order: Vec<VertexId>,
    edges: Vec<Edge>,
    next_group: u64,
    pub center: Option<Point>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.vertices.insert(vertex);
        self.order.push(id);
        id
    }

    pub fn add_edge(&mut self, start: VertexId, end: VertexId, weight: f32, length: f32) {
        self.edges.push(Edge {
            start,
            end,
            weight,
            length,
        });
    }

    pub fn set_center(&mut self, point: Point) {
        self.center = Some(point);
    }

    pub fn get(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Vertices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.order.iter().map(|&id| (id, &self.vertices[id]))
    }

    pub fn lights(&self) -> impl Iterator<Item = (VertexId, &LightVertex)> + '_ {
        self.iter()
            .filter_map(|(id, vertex)| vertex.as_light().map(|light| (id, light)))
    }

    pub fn obstacles(&self) -> impl Iterator<Item = (VertexId, &ObstacleVertex)> + '_ {
        self.iter()
            .filter_map(|(id, vertex)| vertex.as_obstacle().map(|obstacle| (id, obstacle)))
    }

    /// Puts `vertex` in the slot of `id`, keeping its position and edges.
    pub fn replace(&mut self, id: VertexId, vertex: Vertex) -> Option<Vertex> {
        self.vertices
            .get_mut(id)
            .map(|slot| std::mem::replace(slot, vertex))
    }

    /// Removes a vertex and every edge touching it.
    pub fn remove(&mut self, id: VertexId) -> Option<Vertex> {
        let vertex = self.vertices.remove(id)?;
        self.order.retain(|&other| other != id);
        self.prune_edges();
        Some(vertex)
    }

    /// Drops edges whose endpoints are no longer in the graph.
    pub fn prune_edges(&mut self) {
        let vertices = &self.vertices;
        self.edges
            .retain(|edge| vertices.contains_key(edge.start) && vertices.contains_key(edge.end));
    }

    /// Replaces the lights at `old` with `new`, slot for slot. Extra new lights
    /// are appended, surplus old ones are removed together with their edges.
    /// Returns the ids now holding the new lights, in order.
    pub fn replace_lights(&mut self, old: &[VertexId], new: Vec<LightVertex>) -> Vec<VertexId> {
        let mut ids = Vec::with_capacity(new.len());
        let mut new = new.into_iter();

        for &id in old {
            match new.next() {
                Some(light) if self.vertices.contains_key(id) => {
                    self.replace(id, Vertex::Light(light));
                    ids.push(id);
                }
                Some(light) => ids.push(self.add_vertex(Vertex::Light(light))),
                None => {
                    self.vertices.remove(id);
                }
            }
        }
        for light in new {
            ids.push(self.add_vertex(Vertex::Light(light)));
        }

        let vertices = &self.vertices;
        self.order.retain(|&id| vertices.contains_key(id));
        self.prune_edges();
        ids
    }

    /// Adds an element as 8 obstacle corners joined by 12 wireframe edges.
    /// Reflective elements also get a chain of plain influence vertices in
    /// front of their `-y` face. Returns the corner ids.
    pub fn add_element_box(&mut self, element: &Element) -> Vec<VertexId> {
        let Element {
            origin,
            width: w,
            length: l,
            height: h,
            ..
        } = *element;
        let mut attributes = element.attributes();
        attributes.group = Some(self.next_group);
        self.next_group += 1;

        let corners = [
            (0.0, 0.0, 0.0),
            (w, 0.0, 0.0),
            (0.0, l, 0.0),
            (w, l, 0.0),
            (0.0, 0.0, h),
            (w, 0.0, h),
            (0.0, l, h),
            (w, l, h),
        ];
        let ids: Vec<VertexId> = corners
            .iter()
            .map(|&(dx, dy, dz)| {
                self.add_vertex(Vertex::Obstacle(ObstacleVertex {
                    point: Point3::new(origin.x + dx, origin.y + dy, origin.z + dz),
                    attributes: attributes.clone(),
                }))
            })
            .collect();

        let wireframe = [
            (0, 1, w),
            (1, 3, l),
            (3, 2, w),
            (2, 0, l),
            (4, 5, w),
            (5, 7, l),
            (7, 6, w),
            (6, 4, l),
            (0, 4, h),
            (1, 5, h),
            (2, 6, h),
            (3, 7, h),
        ];
        for (i, j, length) in wireframe {
            self.add_edge(ids[i], ids[j], 0.0, length);
        }

        let reflection_factor = attributes.reflection_factor;
        if reflection_factor > 0.0 {
            let face_center = Point3::new(origin.x + w / 2.0, origin.y, origin.z + h / 2.0);
            let normal = -Vector::y();
            let steps = (element.reflection_range / config::REFLECTION_CHAIN_STEP).floor() as usize;
            for step in 1..=steps {
                let dist = step as f32 * config::REFLECTION_CHAIN_STEP;
                let influence = self.add_vertex(Vertex::Plain {
                    point: face_center + normal * dist,
                });
                self.add_edge(ids[0], influence, reflection_factor, dist);
            }
        }

        ids
    }

    /// Adds a furniture light above `element`, sized for its footprint.
    pub fn add_task_light(&mut self, element: &Element, recommended_lux: f32, ceiling_height: f32) -> VertexId {
        let center = Point3::new(
            element.origin.x + element.width / 2.0,
            element.origin.y + element.length / 2.0,
            (element.origin.z + element.height + config::TASK_LIGHT_OFFSET).min(ceiling_height),
        );
        let descriptor = format!("{} {}", element.element_type, element.name);
        let lux = recommended_lux * classify::task_lux_multiplier(&descriptor);
        let footprint = if element.width > 0.0 && element.length > 0.0 {
            element.width * element.length
        } else {
            config::TASK_LIGHT_DEFAULT_AREA
        };
        let lumens = crate::room::required_lumens(footprint, lux);

        let mut light = LightVertex::new(center, lux, lumens, LightType::Furniture)
            .with_room(element.room_id.clone());
        light.target_id = element.element_id;
        self.add_vertex(Vertex::Light(light))
    }

    /// Flattens the graph into position-indexed vertices and edges.
    pub fn to_indexed(&self) -> IndexedGraph {
        let position: std::collections::HashMap<VertexId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();
        let edges = self
            .edges
            .iter()
            .filter_map(|edge| {
                Some(IndexedEdge {
                    start: *position.get(&edge.start)?,
                    end: *position.get(&edge.end)?,
                    weight: edge.weight,
                    length: edge.length,
                })
            })
            .collect();
        IndexedGraph {
            vertices: self.iter().map(|(_, vertex)| vertex.clone()).collect(),
            edges,
            center: self.center,
        }
    }

    /// Builds a graph from its indexed form. Edges pointing past the vertex
    /// list are dropped with a warning.
    pub fn from_indexed(indexed: IndexedGraph) -> Self {
        let mut graph = Graph::new();
        let ids: Vec<VertexId> = indexed
            .vertices
            .into_iter()
            .map(|vertex| graph.add_vertex(vertex))
            .collect();
        for edge in indexed.edges {
            match (ids.get(edge.start), ids.get(edge.end)) {
                (Some(&start), Some(&end)) => graph.add_edge(start, end, edge.weight, edge.length),
                _ => log::warn!(
                    "dropping edge {} -> {}: graph has {} vertices",
                    edge.start,
                    edge.end,
                    ids.len()
                ),
            }
        }
        graph.center = indexed.center;
        graph.next_group = graph
            .obstacles()
            .filter_map(|(_, obstacle)| obstacle.attributes.group)
            .max()
            .map_or(0, |group| group + 1);
        graph
    }
}
