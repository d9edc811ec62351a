//! Shadow-aware placement of ceiling fixtures.
//!
//! The optimizer reads a room graph of lights and obstacles, proposes a
//! fixed menu of fixture layouts for every room, scores each one on
//! illuminance adequacy, projected furniture shadow, aesthetics and fixture
//! spacing, and writes the cheapest layout back in place of the room's
//! centre lights.

pub mod classify;
pub mod config;
pub mod fresnel;
pub mod geom;
pub mod graph;
pub mod layout;
pub mod material;
pub mod optimizer;
pub mod radiometry;
pub mod result;
pub mod room;
pub mod scene;
pub mod settings;
pub mod shadow;
pub mod snell;
