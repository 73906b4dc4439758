//! Track - Course definition and terrain queries
//!
//! `Course` is what cars race around: ordered checkpoints and the
//! start/finish line. `TrackQuery` is how the race asks the world what a car
//! is driving on; `TrackLayout` answers it from plain data.

use serde::{Deserialize, Serialize};

use crate::race_sim::config::SimConfig;
use crate::race_sim::geometry::{point_in_polygon, point_segment_distance_sq, vec2, Vec2};
use crate::race_sim::physics::PhysicsIntegrator;
use crate::race_sim::vehicle::{SurfaceFlags, VehicleState};

/// Identifies a ramp or crest across ticks
pub type JumpSourceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: Vec2,
    pub index: usize,
}

/// Checkpoint sequence and start/finish geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Course {
    pub checkpoints: Vec<Checkpoint>,
    pub start_line: (Vec2, Vec2),
    /// Degrees every car faces on the grid
    pub start_heading: f32,
    /// Pole position; the human car starts here
    pub grid_origin: Vec2,
    /// Where AI cars aim past the line before their first crossing
    pub approach_offset: Vec2,
}

impl Default for Course {
    fn default() -> Self {
        Self::new(&[
            vec2(-700.0, 0.0),
            vec2(-700.0, 450.0),
            vec2(400.0, 450.0),
            vec2(400.0, 0.0),
        ])
    }
}

impl Course {
    /// Course over the given checkpoint positions with the standard start area
    pub fn new(points: &[Vec2]) -> Self {
        Self {
            checkpoints: points
                .iter()
                .enumerate()
                .map(|(index, &position)| Checkpoint { position, index })
                .collect(),
            start_line: (vec2(-200.0, -300.0), vec2(-200.0, 300.0)),
            start_heading: 180.0,
            grid_origin: vec2(0.0, 20.0),
            approach_offset: vec2(-50.0, 0.0),
        }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn checkpoint(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    pub fn start_midpoint(&self) -> Vec2 {
        let (a, b) = self.start_line;
        (a + b) * 0.5
    }

    /// Point AI cars drive at before they have crossed the line once
    pub fn start_target(&self) -> Vec2 {
        self.start_midpoint() + self.approach_offset
    }

    /// Staggered two-wide grid behind the pole for AI car `ai_index`
    pub fn grid_position(&self, ai_index: usize, radius: f32) -> Vec2 {
        let row = (ai_index / 2 + 1) as f32;
        let col = (ai_index % 2) as f32;
        vec2(
            self.grid_origin.x + (col - 0.5) * radius * 2.5,
            self.grid_origin.y - row * radius * 3.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    /// Launches any fast enough car
    Ramp,
    /// Launches once per pass; the car must leave it before it fires again
    Crest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpSource {
    pub id: JumpSourceId,
    pub position: Vec2,
    pub radius: f32,
    pub kind: JumpKind,
}

/// A jump source a car overlaps this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpContact {
    pub id: JumpSourceId,
    pub kind: JumpKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadStrip {
    pub start: Vec2,
    pub end: Vec2,
    pub half_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MudPatch {
    pub vertices: Vec<Vec2>,
}

/// What the race needs to know about the ground under a car
pub trait TrackQuery {
    fn surface_at(&self, position: Vec2) -> SurfaceFlags;
    fn jump_contacts(&self, position: Vec2, radius: f32) -> Vec<JumpContact>;
}

/// Data-driven terrain: roads, mud and jumps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackLayout {
    pub roads: Vec<RoadStrip>,
    pub mud: Vec<MudPatch>,
    pub jumps: Vec<JumpSource>,
}

impl TrackQuery for TrackLayout {
    fn surface_at(&self, position: Vec2) -> SurfaceFlags {
        let on_road = self.roads.iter().any(|road| {
            let hw = road.half_width.max(0.0);
            point_segment_distance_sq(position, road.start, road.end) <= hw * hw
        });
        let on_mud = self
            .mud
            .iter()
            .any(|patch| point_in_polygon(position, &patch.vertices));
        // Open ground only counts as grass on tracks that have roads at all
        let on_grass = !self.roads.is_empty() && !on_road && !on_mud;

        SurfaceFlags {
            on_road,
            on_mud,
            on_grass,
        }
    }

    fn jump_contacts(&self, position: Vec2, radius: f32) -> Vec<JumpContact> {
        self.jumps
            .iter()
            .filter(|jump| {
                let reach = jump.radius.max(0.0) + radius.max(0.0);
                (position - jump.position).norm_squared() < reach * reach
            })
            .map(|jump| JumpContact {
                id: jump.id,
                kind: jump.kind,
            })
            .collect()
    }
}

/// Launch a grounded car off the first jump it is fast enough for.
///
/// Returns whether a jump started.
pub fn apply_jump_contacts(state: &mut VehicleState, contacts: &[JumpContact], cfg: &SimConfig) -> bool {
    if state.flags.airborne {
        return false;
    }

    if let Some(last) = state.last_jump_source {
        if !contacts.iter().any(|c| c.kind == JumpKind::Crest && c.id == last) {
            state.last_jump_source = None;
        }
    }

    let fast_enough = state.velocity.norm() > state.tuning.max_speed * cfg.min_jump_speed_factor;
    if !fast_enough {
        return false;
    }

    for contact in contacts {
        match contact.kind {
            JumpKind::Ramp => {
                if PhysicsIntegrator::trigger_jump(state, cfg) {
                    return true;
                }
            }
            JumpKind::Crest if state.last_jump_source != Some(contact.id) => {
                if PhysicsIntegrator::trigger_jump(state, cfg) {
                    state.last_jump_source = Some(contact.id);
                    return true;
                }
            }
            JumpKind::Crest => {}
        }
    }
    false
}
