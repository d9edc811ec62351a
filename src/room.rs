//! Rooms: type, recommended illuminance, envelope and element assignment.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::{is_wall, DisjointSet};
use crate::config;
use crate::geom::{distance_2d, Bounds, Point};
use crate::graph::Graph;
use crate::settings::Settings;


/// Room categories with their recommended illuminance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Bedroom,
    Living,
    Kitchen,
    Bathroom,
    Office,
    Hallway,
    Dining,
    #[default]
    Unknown,
}

impl RoomType {
    pub const ALL: [RoomType; 8] = [
        RoomType::Bedroom,
        RoomType::Living,
        RoomType::Kitchen,
        RoomType::Bathroom,
        RoomType::Office,
        RoomType::Hallway,
        RoomType::Dining,
        RoomType::Unknown,
    ];

    /// Recommended illuminance (lux).
    pub fn recommended_lux(&self) -> f32 {
        match self {
            RoomType::Bedroom => 200.0,
            RoomType::Living => 300.0,
            RoomType::Kitchen => 500.0,
            RoomType::Bathroom => 300.0,
            RoomType::Office => 500.0,
            RoomType::Hallway => 150.0,
            RoomType::Dining => 300.0,
            RoomType::Unknown => config::DEFAULT_LUX,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::Living => "living",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Office => "office",
            RoomType::Hallway => "hallway",
            RoomType::Dining => "dining",
            RoomType::Unknown => "unknown",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            RoomType::Bedroom => &["bedroom", "bed", "sleeping"],
            RoomType::Living => &["living", "lounge", "family"],
            RoomType::Kitchen => &["kitchen", "cook"],
            RoomType::Bathroom => &["bathroom", "bath", "toilet", "shower", "wc"],
            RoomType::Office => &["office", "study", "work"],
            RoomType::Hallway => &["hallway", "corridor", "passage"],
            RoomType::Dining => &["dining"],
            RoomType::Unknown => &[],
        }
    }

    /// Matches a room name containing one of the type names.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|room_type| *room_type != RoomType::Unknown && name.contains(room_type.name()))
            .unwrap_or_default()
    }

    /// Matches free text against the keyword list of each type, in order.
    pub fn from_keywords(text: &str) -> Self {
        let text = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|room_type| room_type.keywords().iter().any(|kw| text.contains(kw)))
            .unwrap_or_default()
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Luminous flux (lm) needed to light `area` m² at `lux`, with a safety margin.
pub fn required_lumens(area: f32, lux: f32) -> f32 {
    (area * lux * config::LUMEN_SAFETY_FACTOR).max(0.0)
}

/// A room's envelope. Unknown values resolve against [`Settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(default)]
    pub room_type: RoomType,
    /// Overrides the room type's recommendation.
    #[serde(default)]
    pub recommended_lux: Option<f32>,
    /// Floor area (m²).
    #[serde(default)]
    pub area: Option<f32>,
    pub center: Point2<f32>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub ceiling_height: Option<f32>,
}

impl Room {
    pub fn new(id: impl Into<String>, center: Point2<f32>) -> Self {
        Self {
            id: id.into(),
            room_type: RoomType::Unknown,
            recommended_lux: None,
            area: None,
            center,
            bounds: None,
            ceiling_height: None,
        }
    }

    pub fn lux(&self, settings: &Settings) -> f32 {
        self.recommended_lux.unwrap_or(match self.room_type {
            RoomType::Unknown => settings.default_lux,
            known => known.recommended_lux(),
        })
    }

    pub fn area(&self, settings: &Settings) -> f32 {
        self.area
            .or_else(|| self.bounds.map(|b| b.area()))
            .filter(|area| *area > 0.0)
            .unwrap_or(settings.default_room_area)
    }

    pub fn center_point(&self, z: f32) -> Point {
        Point3::new(self.center.x, self.center.y, z)
    }
}

/// Picks the room an element belongs to: the room named by `room_id` when it
/// exists, otherwise the room whose centre is nearest in plan.
pub fn assign_room<'a>(rooms: &'a [Room], room_id: Option<&str>, point: &Point) -> Option<&'a Room> {
    if let Some(room) = room_id.and_then(|id| rooms.iter().find(|room| room.id == id)) {
        return Some(room);
    }
    rooms.iter().min_by(|a, b| {
        let da = distance_2d(&a.center_point(0.0), point);
        let db = distance_2d(&b.center_point(0.0), point);
        da.total_cmp(&db)
    })
}

/// Derives rooms from the graph when none are supplied.
///
/// Wall vertices closer than `room_cluster_distance` join one cluster; each
/// cluster gives a room spanning its bounding box, with the tallest wall
/// vertex as ceiling height. A graph without walls gets one default room
/// centred on the graph centre, or on its first centre light.
pub fn infer_rooms(graph: &Graph, settings: &Settings) -> Vec<Room> {
    let walls: Vec<&Point> = graph
        .obstacles()
        .filter(|(_, obstacle)| is_wall(&obstacle.attributes))
        .map(|(_, obstacle)| &obstacle.point)
        .collect();

    if walls.is_empty() {
        let center = graph
            .center
            .or_else(|| {
                graph
                    .lights()
                    .find(|(_, light)| light.is_center())
                    .map(|(_, light)| light.point)
            })
            .unwrap_or_else(Point3::origin);
        log::debug!("no walls found, using a single default room at {}", center);
        return vec![Room::new("default", Point2::new(center.x, center.y))];
    }

    let mut sets = DisjointSet::new(walls.len());
    for i in 0..walls.len() {
        for j in (i + 1)..walls.len() {
            if distance_2d(walls[i], walls[j]) <= settings.room_cluster_distance {
                sets.union(i, j);
            }
        }
    }

    sets.groups()
        .into_iter()
        .enumerate()
        .filter_map(|(index, members)| {
            let points: Vec<&Point> = members.iter().map(|&i| walls[i]).collect();
            let bounds = Bounds::from_points(points.iter().copied())?;
            let ceiling = points
                .iter()
                .map(|p| p.z)
                .fold(f32::NEG_INFINITY, f32::max);

            let mut room = Room::new(format!("room_{}", index), bounds.center());
            room.area = Some(bounds.area()).filter(|area| *area > 0.0);
            room.bounds = Some(bounds);
            room.ceiling_height = Some(ceiling).filter(|z| *z > settings.floor_z);
            Some(room)
        })
        .collect()
}
