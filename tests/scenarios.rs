use luxplan::{
    classify::classify,
    geom::Bounds,
    graph::{Element, Graph, LightType, LightVertex, ObstacleAttributes, ObstacleVertex, Vertex},
    layout::LayoutKind,
    optimizer::{self, Optimizer, RoomPlan},
    result::RoomOutcome,
    room::Room,
    scene::Scene,
    settings::{self, Settings},
};
use nalgebra::{Point2, Point3};
use std::path::Path;

// Tolerance for illuminance errors expected to vanish
const TOL: f32 = 1e-6;

fn center_light(x: f32, y: f32, lumens: f32) -> LightVertex {
    LightVertex::new(Point3::new(x, y, 2.2), 300.0, lumens, LightType::Center)
}

/// A 1 m x 1 m room with a 2.5 m ceiling, centred on the origin.
fn small_room(id: &str) -> Room {
    let mut room = Room::new(id, Point2::new(0.0, 0.0));
    room.bounds = Some(Bounds::new(Point2::new(-0.5, -0.5), Point2::new(0.5, 0.5)));
    room.ceiling_height = Some(2.5);
    room
}

fn office() -> Room {
    let mut room = Room::new("office", Point2::new(0.0, 0.0));
    room.area = Some(36.0);
    room.ceiling_height = Some(2.5);
    room
}

/// One centre light over the origin and a desk whose top centre sits at `(desk_x, 0, 0.75)`.
fn desk_scene(desk_x: f32, lumens: f32) -> Graph {
    let mut graph = Graph::new();
    graph.add_vertex(Vertex::Light(center_light(0.0, 0.0, lumens)));
    graph.add_element_box(&Element {
        element_id: Some(1),
        element_type: "Desk".to_string(),
        origin: Point3::new(desk_x - 0.6, -0.3, 0.0),
        width: 1.2,
        length: 0.6,
        height: 0.75,
        required_lux: 500.0,
        ..Default::default()
    });
    graph
}

fn plan(graph: &Graph, room: &Room, settings: &Settings) -> RoomPlan {
    let optimizer = Optimizer::new(settings.clone());
    optimizer
        .plan_room(graph, room, &classify(graph, settings))
        .unwrap()
        .unwrap()
}

#[test]
fn flat_empty_room() {
    let settings = settings::load_default_config().unwrap();
    let mut graph = Graph::new();
    graph.add_vertex(Vertex::Light(center_light(0.0, 0.0, 10500.0)));

    let report = Optimizer::new(settings)
        .optimize(&mut graph, &[small_room("r")])
        .unwrap();

    let room = report.room("r").unwrap();
    assert_eq!(room.candidates.len(), 4);
    assert!(room.candidates.iter().all(|c| c.shadow_score == 0.0));
    assert!(room.candidates[0].illuminance_error < TOL);
    assert_eq!(
        room.outcome,
        RoomOutcome::Committed {
            layout: LayoutKind::Single,
            fixtures: 1
        }
    );

    let lights: Vec<_> = graph.lights().collect();
    assert_eq!(lights.len(), 1);
    assert!(lights[0].1.point.x.abs() < TOL && lights[0].1.point.y.abs() < TOL);
}

#[test]
fn desk_under_matching_fixture_meets_target() {
    let settings = Settings::default();
    let graph = desk_scene(0.0, 20000.0);
    let plan = plan(&graph, &office(), &settings);
    assert_eq!(plan.scores[0].kind, LayoutKind::Single);
    assert!(plan.scores[0].illuminance_error < TOL, "{}", plan.scores[0]);
}

#[test]
fn desk_moved_off_axis() {
    let settings = Settings::default();
    let centred = plan(&desk_scene(0.0, 3000.0), &office(), &settings);
    let moved = plan(&desk_scene(3.0, 3000.0), &office(), &settings);

    let single_centred = centred.scores[0].illuminance_error;
    let single_moved = moved.scores[0].illuminance_error;
    let square_moved = moved.scores[3].illuminance_error;
    assert_eq!(moved.scores[3].kind, LayoutKind::Square);

    assert!(single_moved > single_centred);
    assert!(square_moved < single_moved);
}

#[test]
fn edges_are_pruned_after_commit() {
    let mut graph = Graph::new();
    let a = graph.add_vertex(Vertex::Light(center_light(-0.1, 0.0, 5250.0)));
    let b = graph.add_vertex(Vertex::Light(center_light(0.1, 0.0, 5250.0)));
    let p = graph.add_vertex(Vertex::Plain {
        point: Point3::origin(),
    });
    let q = graph.add_vertex(Vertex::Plain {
        point: Point3::new(1.0, 0.0, 0.0),
    });
    graph.add_edge(a, p, 0.0, 2.2);
    graph.add_edge(b, p, 0.0, 2.2);
    graph.add_edge(p, q, 0.0, 1.0);

    let report = Optimizer::new(Settings::default())
        .optimize(&mut graph, &[small_room("r")])
        .unwrap();
    assert!(report.room("r").unwrap().outcome.is_committed());

    let indexed = graph.to_indexed();
    assert_eq!(indexed.vertices.len(), 3);
    assert_eq!(indexed.edges.len(), 2);
    assert!(indexed
        .edges
        .iter()
        .all(|e| e.start < indexed.vertices.len() && e.end < indexed.vertices.len()));
}

#[test]
fn commit_preserves_furniture_lights() {
    let mut graph = desk_scene(1.0, 3000.0);
    let mut task = LightVertex::new(Point3::new(1.0, 0.0, 1.25), 750.0, 650.0, LightType::Furniture);
    task.target_id = Some(1);
    graph.add_vertex(Vertex::Light(task));

    let furniture = |graph: &Graph| -> Vec<LightVertex> {
        graph
            .lights()
            .filter(|(_, light)| !light.is_center())
            .map(|(_, light)| light.clone())
            .collect()
    };
    let before = furniture(&graph);

    let report = Optimizer::new(Settings::default())
        .optimize(&mut graph, &[office()])
        .unwrap();
    assert_eq!(report.committed(), 1);
    assert_eq!(furniture(&graph), before);
}

#[test]
fn rooms_are_optimized_independently() {
    let mut graph = Graph::new();
    graph.add_vertex(Vertex::Light(center_light(0.0, 0.0, 10500.0)));
    let mut empty = small_room("empty");
    empty.center = Point2::new(10.0, 0.0);
    empty.bounds = Some(Bounds::new(Point2::new(9.5, -0.5), Point2::new(10.5, 0.5)));

    let rooms = [small_room("lit"), empty];

    let report = Optimizer::new(Settings::default())
        .optimize(&mut graph.clone(), &rooms)
        .unwrap();
    assert_eq!(report.rooms.len(), 2);
    assert!(report.room("lit").unwrap().outcome.is_committed());
    assert!(matches!(
        report.room("empty").unwrap().outcome,
        RoomOutcome::Skipped { .. }
    ));

    let lights = optimizer::run(&mut graph, &rooms, &Settings::default());
    assert_eq!(lights.len(), 1);
    assert!(lights[0].point.x.abs() < 0.5);
}

#[test]
fn rooms_inferred_from_walls() {
    let mut graph = Graph::new();
    for &(x, y) in &[(-2.0, -2.0), (2.0, -2.0), (2.0, 2.0), (-2.0, 2.0)] {
        graph.add_vertex(Vertex::Obstacle(ObstacleVertex {
            point: Point3::new(x, y, 2.5),
            attributes: ObstacleAttributes {
                element_type: Some("wall".to_string()),
                ..Default::default()
            },
        }));
    }
    graph.add_vertex(Vertex::Light(center_light(0.0, 0.0, 6000.0)));

    let report = Optimizer::new(Settings::default())
        .optimize(&mut graph, &[])
        .unwrap();
    assert_eq!(report.rooms.len(), 1);
    assert_eq!(report.rooms[0].room_id, "room_0");
    assert!(report.rooms[0].outcome.is_committed());

    // walls are left alone and fixtures stay inside the walls
    assert_eq!(graph.obstacles().count(), 4);
    for (_, light) in graph.lights() {
        assert!(light.point.x.abs() <= 1.7 + TOL && light.point.y.abs() <= 1.7 + TOL);
        assert!((light.point.z - 2.2).abs() < TOL);
    }
}

#[test]
fn occlusion_can_be_disabled() {
    let mut graph = desk_scene(0.0, 3000.0);
    // an opaque shelf hanging between the light and the desk
    graph.add_vertex(Vertex::Obstacle(ObstacleVertex {
        point: Point3::new(0.0, 0.0, 1.5),
        attributes: ObstacleAttributes {
            element_id: Some(9),
            material: Some("oak".to_string()),
            ..Default::default()
        },
    }));
    let occluded = plan(&graph, &office(), &Settings::default());
    let open = plan(
        &graph,
        &office(),
        &Settings {
            occlusion: false,
            ..Default::default()
        },
    );
    assert!(occluded.scores[0].illuminance_error > open.scores[0].illuminance_error);
}

#[test]
fn studio_scene_end_to_end() {
    let settings = Settings::default();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes/studio.json");
    let (mut graph, rooms) = Scene::load(&path).unwrap().build(&settings);
    assert_eq!(rooms.len(), 1);

    // desk and sofa get task lights, the shelf does not
    let task_lights = |graph: &Graph| graph.lights().filter(|(_, light)| !light.is_center()).count();
    assert_eq!(task_lights(&graph), 2);

    let report = Optimizer::new(settings).optimize(&mut graph, &rooms).unwrap();
    assert_eq!(report.committed(), 1);
    assert_eq!(task_lights(&graph), 2);

    let indexed = graph.to_indexed();
    assert!(indexed
        .edges
        .iter()
        .all(|e| e.start < indexed.vertices.len() && e.end < indexed.vertices.len()));
}

#[test]
fn scene_elements_without_ids() {
    let scene: Scene = serde_json::from_str(
        r#"{
            "graph": {
                "vertices": [
                    { "kind": "light", "point": [0.5, 0.5, 2.2], "lux": 300.0, "lumens": 3000.0 }
                ]
            },
            "rooms": [ { "id": "study", "room_type": "office", "center": [0.5, 0.5], "ceiling_height": 2.5 } ],
            "elements": [
                { "element_type": "Desk", "origin": [0.0, 0.0, 0.0], "width": 1.0, "length": 1.0, "height": 0.8 },
                { "element_type": "Table", "origin": [3.0, 0.0, 0.0], "width": 1.0, "length": 1.0, "height": 0.8 }
            ]
        }"#,
    )
    .unwrap();
    let settings = Settings::default();
    let (graph, rooms) = scene.build(&settings);

    // one task light and one task target per element
    assert_eq!(graph.lights().filter(|(_, light)| !light.is_center()).count(), 2);
    let classes = classify(&graph, &settings);
    assert_eq!(classes.task_furniture.len(), 2);
    assert!(classes.task_furniture.iter().all(|t| (t.point.z - 0.8).abs() < TOL));

    let plan = plan(&graph, &rooms[0], &settings);
    assert!(plan.scores.iter().all(|s| s.shadow_score.is_finite()));
}
