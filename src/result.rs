use serde::Serialize;
use std::fmt;

use crate::layout::LayoutKind;


/// Cost breakdown of one candidate layout. Lower totals are better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub kind: LayoutKind,
    pub illuminance_error: f32,
    pub shadow_score: f32,
    /// `1 - aesthetic`, so prettier layouts cost less.
    pub aesthetic_penalty: f32,
    pub proximity_penalty: f32,
    pub total: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoomOutcome {
    Committed { layout: LayoutKind, fixtures: usize },
    /// Nothing to optimize; lights untouched.
    Skipped { reason: String },
    /// Optimization failed; lights untouched.
    Failed { error: String },
}

impl RoomOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, RoomOutcome::Committed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomReport {
    pub room_id: String,
    pub candidates: Vec<CandidateScore>,
    pub outcome: RoomOutcome,
}

impl RoomReport {
    /// The lowest-cost candidate, first one on ties.
    pub fn best(&self) -> Option<&CandidateScore> {
        self.candidates
            .iter()
            .fold(None, |best: Option<&CandidateScore>, score| match best {
                Some(b) if b.total <= score.total => Some(b),
                _ => Some(score),
            })
    }
}

/// Summary of one optimizer run, in room order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Report {
    pub rooms: Vec<RoomReport>,
}

impl Report {
    pub fn committed(&self) -> usize {
        self.rooms
            .iter()
            .filter(|room| room.outcome.is_committed())
            .count()
    }

    pub fn room(&self, room_id: &str) -> Option<&RoomReport> {
        self.rooms.iter().find(|room| room.room_id == room_id)
    }
}

impl fmt::Display for CandidateScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<9} illum {:>8.4}  shadow {:>7.4}  aesth {:>5.2}  prox {:>7.4}  total {:>8.4}",
            self.kind.to_string(),
            self.illuminance_error,
            self.shadow_score,
            self.aesthetic_penalty,
            self.proximity_penalty,
            self.total
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rooms: {} ({} committed)", self.rooms.len(), self.committed())?;
        for room in &self.rooms {
            match &room.outcome {
                RoomOutcome::Committed { layout, fixtures } => {
                    writeln!(f, "  {}: {} layout, {} fixture(s)", room.room_id, layout, fixtures)?
                }
                RoomOutcome::Skipped { reason } => writeln!(f, "  {}: skipped ({})", room.room_id, reason)?,
                RoomOutcome::Failed { error } => writeln!(f, "  {}: failed ({})", room.room_id, error)?,
            }
            for score in &room.candidates {
                writeln!(f, "    {}", score)?;
            }
        }
        Ok(())
    }
}
