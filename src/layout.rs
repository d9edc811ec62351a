//! Candidate fixture layouts around a room's anchor light.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

use crate::graph::{LightType, LightVertex};
use crate::room::{required_lumens, Room};
use crate::settings::Settings;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geom::Bounds;
    use nalgebra::Point2;

    fn room(area: f32) -> Room {
        let mut room = Room::new("r1", Point2::new(0.0, 0.0));
        room.area = Some(area);
        room.ceiling_height = Some(2.5);
        room
    }

    fn anchor() -> LightVertex {
        LightVertex::new(Point3::new(0.0, 0.0, 2.2), 300.0, 4000.0, LightType::Center)
    }

    #[test]
    fn four_candidates_in_fixed_order() {
        let settings = Settings::default();
        let candidates = generate_candidates(&anchor(), &room(36.0), &settings);
        let kinds: Vec<_> = candidates.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, LayoutKind::ALL.to_vec());
        for candidate in &candidates {
            assert_eq!(candidate.lights.len(), candidate.kind.fixture_count());
            for light in &candidate.lights {
                assert!((light.point.z - 2.2).abs() < 1e-6);
                assert_eq!(light.light_type, LightType::Center);
                assert_eq!(light.room_id.as_deref(), Some("r1"));
            }
        }
        assert_eq!(candidates[0].aesthetic, 1.0);
        assert!(candidates[3].aesthetic > candidates[2].aesthetic);
        assert!(candidates[2].aesthetic > candidates[1].aesthetic);
    }

    #[test]
    fn spacing_is_capped_by_room_size() {
        let settings = Settings::default();

        // large room: capped at 2.0 m
        let dual = &generate_candidates(&anchor(), &room(100.0), &settings)[1];
        assert!((dual.lights[0].point.x + 1.0).abs() < 1e-5);
        assert!((dual.lights[1].point.x - 1.0).abs() < 1e-5);

        // small room: 0.4 * sqrt(4) = 0.8 m
        let dual = &generate_candidates(&anchor(), &room(4.0), &settings)[1];
        assert!((dual.lights[1].point.x - 0.4).abs() < 1e-5);

        let square = &generate_candidates(&anchor(), &room(100.0), &settings)[3];
        for light in &square.lights {
            let radius = light.point.x.hypot(light.point.y);
            assert!((radius - 1.2).abs() < 1e-5);
        }

        let triangle = &generate_candidates(&anchor(), &room(100.0), &settings)[2];
        assert!((triangle.lights[0].point.x - 1.5).abs() < 1e-5);
        assert!(triangle.lights[0].point.y.abs() < 1e-5);
    }

    #[test]
    fn lumen_budget_is_split() {
        let settings = Settings::default();
        let candidates = generate_candidates(&anchor(), &room(36.0), &settings);
        for candidate in &candidates {
            let total: f32 = candidate.lights.iter().map(|l| l.lumens).sum();
            let factor = settings.layouts.params(candidate.kind).lumen_factor;
            assert!((total - 4000.0 * factor).abs() < 1e-2);
        }
        assert!(candidates[3].lights[0].lumens < candidates[0].lights[0].lumens);
    }

    #[test]
    fn unlit_anchor_is_sized_from_room() {
        let settings = Settings::default();
        let mut dark = anchor();
        dark.lumens = 0.0;
        let single = &generate_candidates(&dark, &room(10.0), &settings)[0];
        assert!((single.lights[0].lumens - 10.0 * 300.0 * 1.2).abs() < 1e-2);
    }

    #[test]
    fn positions_stay_inside_bounds() {
        let settings = Settings::default();
        let mut narrow = room(100.0);
        narrow.bounds = Some(Bounds::new(Point2::new(-1.0, -5.0), Point2::new(1.0, 5.0)));
        for candidate in generate_candidates(&anchor(), &narrow, &settings) {
            for light in candidate.lights {
                assert!(light.point.x >= -0.7 - 1e-6 && light.point.x <= 0.7 + 1e-6);
            }
        }
    }

    #[test]
    fn fixtures_hang_below_known_ceiling() {
        let settings = Settings::default();
        let mut tall = room(20.0);
        tall.ceiling_height = Some(3.2);
        let single = &generate_candidates(&anchor(), &tall, &settings)[0];
        assert!((single.lights[0].point.z - 2.9).abs() < 1e-6);
    }
}

/// The fixed menu of symmetric fixture arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Single,
    Dual,
    Triangle,
    Square,
}

impl LayoutKind {
    /// Evaluation order. Ties in cost go to the earliest entry.
    pub const ALL: [LayoutKind; 4] = [
        LayoutKind::Single,
        LayoutKind::Dual,
        LayoutKind::Triangle,
        LayoutKind::Square,
    ];

    pub fn fixture_count(&self) -> usize {
        match self {
            LayoutKind::Single => 1,
            LayoutKind::Dual => 2,
            LayoutKind::Triangle => 3,
            LayoutKind::Square => 4,
        }
    }

    /// Plan offsets from the anchor for a layout of the given size.
    fn offsets(&self, size: f32) -> Vec<(f32, f32)> {
        match self {
            LayoutKind::Single => vec![(0.0, 0.0)],
            LayoutKind::Dual => vec![(-size / 2.0, 0.0), (size / 2.0, 0.0)],
            LayoutKind::Triangle => (0..3)
                .map(|i| {
                    let angle = i as f32 * 2.0 * PI / 3.0;
                    (size * angle.cos(), size * angle.sin())
                })
                .collect(),
            LayoutKind::Square => {
                let h = size * FRAC_1_SQRT_2;
                vec![(-h, -h), (h, -h), (h, h), (-h, h)]
            }
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutKind::Single => "single",
            LayoutKind::Dual => "dual",
            LayoutKind::Triangle => "triangle",
            LayoutKind::Square => "square",
        };
        write!(f, "{}", name)
    }
}

/// One proposed set of centre lights for a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: LayoutKind,
    pub lights: Vec<LightVertex>,
    /// Aesthetic preference in [0, 1], higher is better.
    pub aesthetic: f32,
}

/// Builds every layout of [`LayoutKind::ALL`] around `anchor`.
///
/// Fixtures hang `fixture_drop` below the room's ceiling. Without a known
/// ceiling the anchor height is kept. The anchor's lumens are the budget
/// for the whole layout; an anchor without output is sized from the room.
pub fn generate_candidates(anchor: &LightVertex, room: &Room, settings: &Settings) -> Vec<Candidate> {
    let area = room.area(settings);
    let lux = room.lux(settings);
    let z = room
        .ceiling_height
        .map(|ceiling| ceiling - settings.fixture_drop)
        .unwrap_or(anchor.point.z);
    let budget = if anchor.lumens > 0.0 {
        anchor.lumens
    } else {
        required_lumens(area, lux)
    };

    LayoutKind::ALL
        .iter()
        .map(|&kind| {
            let params = settings.layouts.params(kind);
            let size = params.max_spacing.min(params.area_fraction * area.sqrt());
            let lumens = budget * params.lumen_factor / kind.fixture_count() as f32;

            let lights = kind
                .offsets(size)
                .into_iter()
                .map(|(dx, dy)| {
                    let mut point = Point3::new(anchor.point.x + dx, anchor.point.y + dy, z);
                    if let Some(bounds) = &room.bounds {
                        point = bounds.clamp(&point, settings.wall_margin);
                    }
                    LightVertex::new(point, lux, lumens, LightType::Center)
                        .with_room(Some(room.id.clone()))
                })
                .collect();

            Candidate {
                kind,
                lights,
                aesthetic: params.aesthetic,
            }
        })
        .collect()
}
