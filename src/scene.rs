//! Scene files: an indexed graph, optional rooms and extra elements.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::classify::is_task_furniture;
use crate::graph::{Element, Graph, IndexedGraph, LightVertex};
use crate::result::Report;
use crate::room::{assign_room, Room};
use crate::settings::Settings;


#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub graph: IndexedGraph,
    #[serde(default)]
    pub rooms: Vec<Room>,
    /// Elements to add as boxes; task furniture also gets a light.
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// What the CLI writes back: the optimized graph, its lights and the report.
#[derive(Debug, Clone, Serialize)]
pub struct SceneOutput {
    pub graph: IndexedGraph,
    pub lights: Vec<LightVertex>,
    pub report: Report,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("could not read scene file {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("could not parse scene file {:?}", path))
    }

    /// Builds the graph, adding every extra element as a box and a task light
    /// over each piece of task furniture.
    pub fn build(self, settings: &Settings) -> (Graph, Vec<Room>) {
        let mut graph = Graph::from_indexed(self.graph);

        for element in &self.elements {
            graph.add_element_box(element);
            let descriptor = format!("{} {}", element.element_type, element.name);
            if !is_task_furniture(&descriptor) {
                continue;
            }

            let room = assign_room(&self.rooms, element.room_id.as_deref(), &element.origin);
            let lux = room.map_or(settings.default_lux, |room| room.lux(settings));
            let ceiling = room
                .and_then(|room| room.ceiling_height)
                .unwrap_or(settings.default_ceiling_height);

            let mut element = element.clone();
            if element.room_id.is_none() {
                element.room_id = room.map(|room| room.id.clone());
            }
            graph.add_task_light(&element, lux, ceiling);
        }
        log::info!(
            "scene has {} vertices, {} edges and {} room(s)",
            graph.len(),
            graph.edges().len(),
            self.rooms.len()
        );

        (graph, self.rooms)
    }
}
