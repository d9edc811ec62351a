//! Default physical and geometric constants.
//!
//! None of these are measured values. They are modelling choices that seed
//! [`crate::settings::Settings`], which is where they should be overridden.

/// Lower bound on any source-to-point distance (m), avoids the 1/d² singularity.
pub const DISTANCE_EPSILON: f32 = 0.1;
/// Lambert cosines below this are treated as grazing and contribute nothing.
pub const COSINE_THRESHOLD: f32 = 0.1;
/// Air extinction coefficient (1/m) for `exp(-k·d)`.
pub const AIR_EXTINCTION: f32 = 0.05;
/// Surfaces need a reflection factor above this to reflect light.
pub const REFLECTION_THRESHOLD: f32 = 0.05;
/// Cumulative path transmission below this counts as fully blocked.
pub const TRANSMISSION_CUTOFF: f32 = 0.01;
/// Radius (m) of the cylinder around an obstacle vertex that occludes a segment.
pub const BLOCKING_RADIUS: f32 = 0.3;
/// Shadow vectors whose direct path is obstructed are scaled by this factor.
pub const BLOCKED_SHADOW_FACTOR: f32 = 0.1;

/// Refractive index of the surrounding air.
pub const MEDIUM_REFR_INDEX: f32 = 1.0;
/// Slab thickness (m) when neither the element nor the material table gives one.
pub const DEFAULT_THICKNESS: f32 = 0.01;

/// Height of the floor plane (m).
pub const FLOOR_Z: f32 = 0.0;
/// Height (m) of the sampling grid used when a room has no task furniture.
pub const WORK_PLANE_HEIGHT: f32 = 0.8;
/// Fixtures hang this far (m) below the ceiling.
pub const FIXTURE_DROP: f32 = 0.3;
/// Candidate fixtures are kept this far (m) inside the room bounds.
pub const WALL_MARGIN: f32 = 0.3;
/// Offset (m) of the extra sample points around each task surface.
pub const SAMPLE_OFFSET: f32 = 0.5;
/// Number of grid divisions per axis for rooms without task furniture.
pub const GRID_DIVISIONS: usize = 3;

/// Lumen safety factor used when sizing a room from its area.
pub const LUMEN_SAFETY_FACTOR: f32 = 1.2;
/// Recommended illuminance (lux) when nothing better is known.
pub const DEFAULT_LUX: f32 = 300.0;
/// Room area (m²) when nothing better is known.
pub const DEFAULT_ROOM_AREA: f32 = 20.0;
/// Ceiling height (m) when nothing better is known.
pub const DEFAULT_CEILING_HEIGHT: f32 = 2.5;

/// Edges shorter than this (m) join obstacle vertices into one furniture item.
pub const CLUSTER_EDGE_LENGTH: f32 = 2.0;
/// Minimum number of vertices for a cluster to count as furniture.
pub const CLUSTER_MIN_SIZE: usize = 4;
/// Walls closer than this (m) are considered part of the same room.
pub const ROOM_CLUSTER_DISTANCE: f32 = 5.0;

/// Upper bound of the normalized shadow score.
pub const SHADOW_SCORE_CAP: f32 = 10.0;
/// Illuminance above `target * OVERLIT_FACTOR` is penalised as over-lighting.
pub const OVERLIT_FACTOR: f32 = 1.5;
/// Weight of the over-lighting penalty relative to the deficit penalty.
pub const OVERLIT_WEIGHT: f32 = 0.5;
/// Fixtures closer than this (m) to each other attract a proximity penalty.
pub const MIN_FIXTURE_SPACING: f32 = 1.0;

/// Spacing (m) of the reflection influence chain in front of an element.
pub const REFLECTION_CHAIN_STEP: f32 = 0.5;
/// Height (m) of a task light above the element it serves.
pub const TASK_LIGHT_OFFSET: f32 = 0.5;
/// Footprint (m²) assumed for task lights over elements of unknown size.
pub const TASK_LIGHT_DEFAULT_AREA: f32 = 2.0;
