//! Scores candidate layouts per room and commits the cheapest.
//!
//! A run classifies the graph once, plans every room in parallel against
//! that read-only snapshot, then commits the winning layouts one room at a
//! time. Planning never touches the graph, so a room that fails or is
//! skipped keeps its lights exactly as they were.

use anyhow::{anyhow, Result};
use nalgebra::Point3;
use rayon::prelude::*;

use crate::classify::{classify, Classification};
use crate::geom::{centroid, distance_3d, Bounds, Point};
use crate::graph::{Graph, LightType, LightVertex, ObstacleVertex, VertexId};
use crate::layout::{generate_candidates, Candidate};
use crate::radiometry::{illuminance_at, Surroundings};
use crate::result::{CandidateScore, Report, RoomOutcome, RoomReport};
use crate::room::{infer_rooms, Room};
use crate::settings::{validate_config, Settings};
use crate::shadow::shadow_score;


/// A point the layout must light, with its target illuminance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub point: Point,
    pub target_lux: f32,
}

/// The outcome of planning one room: every candidate's score and the winner.
#[derive(Debug, Clone)]
pub struct RoomPlan {
    pub room_id: String,
    /// Centre lights the winner replaces, in graph order.
    pub replaces: Vec<VertexId>,
    pub scores: Vec<CandidateScore>,
    pub selected: Candidate,
}

/// Layout optimizer bound to one set of [`Settings`].
#[derive(Debug, Clone)]
pub struct Optimizer {
    settings: Settings,
}

impl Optimizer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Plans every room and commits the winning layouts into `graph`.
    ///
    /// **Context**: Rooms are independent: each one only reads the graph and
    /// its own share of the classification, so planning runs in parallel.
    /// Commits change vertex slots and must stay sequential.
    ///
    /// **How it Works**: Validates the settings, classifies the graph, infers
    /// rooms when none are given, plans each room with rayon, then replaces
    /// each planned room's centre lights in room order. Furniture lights are
    /// never touched. Errors in one room are logged and reported without
    /// affecting the others.
    pub fn optimize(&self, graph: &mut Graph, rooms: &[Room]) -> Result<Report> {
        validate_config(&self.settings)?;

        let inferred;
        let rooms = if rooms.is_empty() {
            inferred = infer_rooms(graph, &self.settings);
            log::info!("inferred {} room(s) from the graph", inferred.len());
            &inferred[..]
        } else {
            rooms
        };

        let classes = classify(graph, &self.settings);
        let snapshot: &Graph = graph;
        let plans: Vec<(String, Result<Option<RoomPlan>>)> = rooms
            .par_iter()
            .map(|room| {
                let room_classes = classes.for_room(snapshot, rooms, &room.id);
                (room.id.clone(), self.plan_room(snapshot, room, &room_classes))
            })
            .collect();

        let mut report = Report::default();
        for (room_id, plan) in plans {
            let room_report = match plan {
                Ok(Some(plan)) => {
                    let layout = plan.selected.kind;
                    let fixtures = plan.selected.lights.len();
                    graph.replace_lights(&plan.replaces, plan.selected.lights);
                    log::info!(
                        "room {}: committed {} layout with {} fixture(s)",
                        room_id,
                        layout,
                        fixtures
                    );
                    RoomReport {
                        room_id,
                        candidates: plan.scores,
                        outcome: RoomOutcome::Committed { layout, fixtures },
                    }
                }
                Ok(None) => {
                    log::warn!("room {}: no centre light to anchor on, skipping", room_id);
                    RoomReport {
                        room_id,
                        candidates: Vec::new(),
                        outcome: RoomOutcome::Skipped {
                            reason: "no centre light".to_string(),
                        },
                    }
                }
                Err(e) => {
                    log::warn!("room {}: optimization failed, keeping original lights: {}", room_id, e);
                    RoomReport {
                        room_id,
                        candidates: Vec::new(),
                        outcome: RoomOutcome::Failed { error: e.to_string() },
                    }
                }
            };
            report.rooms.push(room_report);
        }

        Ok(report)
    }

    /// Scores every candidate layout for `room`.
    ///
    /// Returns `Ok(None)` when the room has no centre light to anchor on.
    /// `classes` must already be restricted to the room.
    pub fn plan_room(&self, graph: &Graph, room: &Room, classes: &Classification) -> Result<Option<RoomPlan>> {
        let settings = &self.settings;
        let Some(anchor) = anchor_light(graph, &classes.center_lights) else {
            return Ok(None);
        };
        if !(anchor.point.x.is_finite() && anchor.point.y.is_finite() && anchor.point.z.is_finite()) {
            return Err(anyhow!("anchor light has a non-finite position"));
        }
        if let Some(ceiling) = room.ceiling_height {
            if !ceiling.is_finite() || ceiling <= settings.floor_z + settings.fixture_drop {
                return Err(anyhow!("ceiling height {} leaves no room for fixtures", ceiling));
            }
        }

        let surroundings = Surroundings::new(graph, classes);
        let obstacles: Vec<&ObstacleVertex> = classes
            .obstacles
            .iter()
            .filter_map(|&id| graph.get(id).and_then(|v| v.as_obstacle()))
            .collect();
        let task_lights: Vec<&LightVertex> = classes
            .furniture_lights
            .iter()
            .filter_map(|&id| graph.get(id).and_then(|v| v.as_light()))
            .collect();
        let samples = sample_points(room, classes, settings);
        let area = room.area(settings);

        let mut scores = Vec::with_capacity(4);
        let mut selected: Option<(f32, Candidate)> = None;
        for candidate in generate_candidates(&anchor, room, settings) {
            let score = self.score_candidate(
                &candidate,
                &samples,
                &obstacles,
                &task_lights,
                area,
                &surroundings,
            );
            log::debug!("room {}: {}", room.id, score);

            // strict comparison keeps the earliest layout on ties
            let better = score.total.is_finite()
                && selected.as_ref().map_or(true, |(best, _)| score.total < *best);
            if better {
                selected = Some((score.total, candidate));
            }
            scores.push(score);
        }

        let (_, selected) = selected.ok_or_else(|| anyhow!("no candidate layout has a finite score"))?;
        Ok(Some(RoomPlan {
            room_id: room.id.clone(),
            replaces: classes.center_lights.clone(),
            scores,
            selected,
        }))
    }

    /// Weighted cost of one candidate.
    pub fn score_candidate(
        &self,
        candidate: &Candidate,
        samples: &[SamplePoint],
        obstacles: &[&ObstacleVertex],
        task_lights: &[&LightVertex],
        room_area: f32,
        surroundings: &Surroundings,
    ) -> CandidateScore {
        let settings = &self.settings;
        let weights = &settings.weights;

        let mut lights: Vec<&LightVertex> = candidate.lights.iter().collect();
        if settings.include_task_lights {
            lights.extend(task_lights.iter().copied());
        }

        let illuminance_error = illuminance_error(&lights, samples, surroundings, settings);
        let shadow_score = shadow_score(&candidate.lights, obstacles, room_area, surroundings, settings);
        let aesthetic_penalty = 1.0 - candidate.aesthetic;
        let proximity_penalty = proximity_penalty(&candidate.lights, task_lights, settings);

        CandidateScore {
            kind: candidate.kind,
            illuminance_error,
            shadow_score,
            aesthetic_penalty,
            proximity_penalty,
            total: weights.illuminance * illuminance_error
                + weights.shadow * shadow_score
                + weights.aesthetic * aesthetic_penalty
                + weights.proximity * proximity_penalty,
        }
    }
}

/// Optimizes `graph` in place and returns every light it holds afterwards.
/// A run that cannot start returns no lights and leaves the graph as it was.
pub fn run(graph: &mut Graph, rooms: &[Room], settings: &Settings) -> Vec<LightVertex> {
    match Optimizer::new(settings.clone()).optimize(graph, rooms) {
        Ok(report) => {
            log::info!("optimized {} of {} room(s)", report.committed(), report.rooms.len());
            graph.lights().map(|(_, light)| light.clone()).collect()
        }
        Err(e) => {
            log::error!("optimizer failed: {:#}", e);
            Vec::new()
        }
    }
}

/// A stand-in for the room's centre lights: placed at their centroid,
/// carrying their combined lumens.
fn anchor_light(graph: &Graph, center_lights: &[VertexId]) -> Option<LightVertex> {
    let lights: Vec<&LightVertex> = center_lights
        .iter()
        .filter_map(|&id| graph.get(id).and_then(|v| v.as_light()))
        .collect();
    let first = lights.first()?;
    let points: Vec<Point> = lights.iter().map(|light| light.point).collect();
    let point = centroid(&points)?;
    let lumens = lights.iter().map(|light| light.lumens).sum();
    Some(LightVertex::new(point, first.lux, lumens, LightType::Center).with_room(first.room_id.clone()))
}

/// Points the layout is judged on: each task target and four points around
/// it, or a grid over the room at work-plane height when there is no
/// furniture to light.
pub fn sample_points(room: &Room, classes: &Classification, settings: &Settings) -> Vec<SamplePoint> {
    if classes.task_furniture.is_empty() {
        return grid_samples(room, settings);
    }
    let room_lux = room.lux(settings);
    let offset = settings.sample_offset;
    classes
        .task_furniture
        .iter()
        .flat_map(|target| {
            let target_lux = if target.required_lux > 0.0 {
                target.required_lux
            } else {
                room_lux
            };
            let p = target.point;
            [(0.0, 0.0), (offset, 0.0), (-offset, 0.0), (0.0, offset), (0.0, -offset)]
                .into_iter()
                .map(move |(dx, dy)| SamplePoint {
                    point: Point3::new(p.x + dx, p.y + dy, p.z),
                    target_lux,
                })
        })
        .collect()
}

fn grid_samples(room: &Room, settings: &Settings) -> Vec<SamplePoint> {
    let bounds = room.bounds.unwrap_or_else(|| {
        let half = room.area(settings).sqrt() / 2.0;
        let offset = nalgebra::Vector2::new(half, half);
        Bounds::new(room.center - offset, room.center + offset)
    });
    let n = settings.grid_divisions;
    let z = settings.floor_z + settings.work_plane_height;
    let target_lux = room.lux(settings);

    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            let fx = (i as f32 + 0.5) / n as f32;
            let fy = (j as f32 + 0.5) / n as f32;
            SamplePoint {
                point: Point3::new(
                    bounds.min.x + fx * bounds.width(),
                    bounds.min.y + fy * bounds.length(),
                    z,
                ),
                target_lux,
            }
        })
        .collect()
}

/// Error at one point: squared relative deficit below target, zero inside
/// the over-lighting band. Above the band the relative excess `x` costs
/// `overlit_weight · min(x, x²)`: linear for large excess, and never more
/// than a deficit of the same relative size.
pub fn point_error(illuminance: f32, target: f32, settings: &Settings) -> f32 {
    if target <= 0.0 {
        return 0.0;
    }
    let upper = settings.overlit_factor * target;
    if illuminance < target {
        ((target - illuminance) / target).powi(2)
    } else if illuminance > upper {
        let excess = (illuminance - upper) / target;
        settings.overlit_weight * excess.min(excess * excess)
    } else {
        0.0
    }
}

/// Mean [`point_error`] over the samples.
pub fn illuminance_error(
    lights: &[&LightVertex],
    samples: &[SamplePoint],
    surroundings: &Surroundings,
    settings: &Settings,
) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|sample| {
            let illuminance = illuminance_at(&sample.point, lights.iter().copied(), surroundings, settings);
            point_error(illuminance, sample.target_lux, settings)
        })
        .sum();
    sum / samples.len() as f32
}

/// Penalty for fixtures closer than the minimum spacing, to each other or
/// to task lights: `(1 - d/min)²` per offending pair.
pub fn proximity_penalty(lights: &[LightVertex], task_lights: &[&LightVertex], settings: &Settings) -> f32 {
    let min = settings.min_fixture_spacing;
    if min <= 0.0 {
        return 0.0;
    }
    let pair = |a: &Point, b: &Point| {
        let d = distance_3d(a, b);
        if d < min {
            (1.0 - d / min).powi(2)
        } else {
            0.0
        }
    };

    let mut penalty = 0.0;
    for (i, a) in lights.iter().enumerate() {
        for b in &lights[i + 1..] {
            penalty += pair(&a.point, &b.point);
        }
        for task in task_lights {
            penalty += pair(&a.point, &task.point);
        }
    }
    penalty
}
