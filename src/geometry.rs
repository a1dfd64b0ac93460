//! Approaches, lane roles and the fixed layout of the intersection.

use crate::config::SimulationConfig;
use crate::util::Interval;
use cgmath::{Point2, Vector2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point in screen space.
pub type Point2d = Point2<f64>;

/// A 2D vector in screen space.
pub type Vector2d = Vector2<f64>;

/// How far before the edge of the view arriving vehicles are placed, in units.
const SPAWN_MARGIN: f64 = 40.0;

/// How far past the edge of the view departing vehicles are removed, in units.
const EXIT_MARGIN: f64 = 200.0;

/// One of the four arms of the intersection.
///
/// Screen space has its y-axis pointing down, so the north arm is at the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Approach {
    /// Road `A`, at the top of the view.
    North,
    /// Road `B`, at the bottom of the view.
    South,
    /// Road `C`, on the right of the view.
    East,
    /// Road `D`, on the left of the view.
    West,
}

/// The right-of-way rules a lane obeys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LaneRole {
    /// The lane vehicles leave the intersection by. Never signalled.
    Incoming,
    /// The lane that obeys the signal and is queued in arrival order.
    Controlled,
    /// The dedicated left-turn lane, which never stops for the signal.
    FreeTurn,
}

impl Approach {
    /// All approaches, in signal rotation order.
    pub const ALL: [Approach; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// The index of the approach in [Self::ALL].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The single-letter road label used by the arrival feed.
    pub fn label(self) -> char {
        match self {
            Self::North => 'A',
            Self::South => 'B',
            Self::East => 'C',
            Self::West => 'D',
        }
    }

    /// Parses a road label.
    pub fn from_label(label: char) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == label)
    }

    /// The approach that follows this one in the signal rotation.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// The approach a vehicle arriving on this one leaves by when going straight.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// The approach a vehicle arriving on this one leaves by when turning right.
    pub fn right_turn(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::South => Self::East,
            Self::East => Self::North,
            Self::West => Self::South,
        }
    }

    /// The approach a vehicle arriving on this one leaves by when turning left.
    pub fn left_turn(self) -> Self {
        self.right_turn().opposite()
    }

    /// A unit vector in the direction of travel of vehicles arriving on this approach.
    pub fn heading(self) -> Vector2d {
        match self {
            Self::North => Vector2::new(0.0, 1.0),
            Self::South => Vector2::new(0.0, -1.0),
            Self::East => Vector2::new(-1.0, 0.0),
            Self::West => Vector2::new(1.0, 0.0),
        }
    }

    /// Whether the approach runs along the vertical axis of the view.
    fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

impl LaneRole {
    /// All lane roles, in lane order from the kerb.
    pub const ALL: [LaneRole; 3] = [Self::Incoming, Self::Controlled, Self::FreeTurn];

    /// The lane index used by the arrival feed.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parses a lane index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether vehicles in this lane are travelling towards the intersection.
    pub fn is_arrival(self) -> bool {
        !matches!(self, Self::Incoming)
    }
}

/// The fixed geometry of the intersection.
///
/// Each lane has its own travel coordinate, which increases in the direction of travel.
/// Arrival lanes measure it along the approach's heading with zero at the centre of the
/// intersection, so arriving vehicles have negative coordinates. The incoming lane of an
/// approach measures it outwards from the centre.
#[derive(Clone, Debug)]
pub struct Layout {
    /// The centre of the intersection in screen space.
    centre: Point2d,
    /// Half the width and height of the view.
    half_view: Vector2d,
    /// The coordinates along any arrival lane that lie within the intersection box.
    footprint: Interval<f64>,
    /// The coordinate of the stop line on every arrival lane.
    stop_line: f64,
    /// The vehicle length.
    vehicle_length: f64,
    /// The lane width.
    lane_width: f64,
}

impl Layout {
    /// Creates the layout described by a configuration.
    pub fn new(config: &SimulationConfig) -> Self {
        let half_road = 0.5 * config.road_width;
        Self {
            centre: Point2d::new(0.5 * config.view_width, 0.5 * config.view_height),
            half_view: Vector2::new(0.5 * config.view_width, 0.5 * config.view_height),
            footprint: Interval::disc(0.0, half_road),
            stop_line: -(half_road + config.stop_line_margin),
            vehicle_length: config.vehicle_length,
            lane_width: config.lane_width,
        }
    }

    /// The centre of the intersection in screen space.
    pub fn centre(&self) -> Point2d {
        self.centre
    }

    /// The coordinate at which new vehicles enter the given lane.
    pub fn entry(&self, approach: Approach, role: LaneRole) -> f64 {
        match role {
            LaneRole::Incoming => self.footprint.max + 0.5 * self.vehicle_length,
            _ => -(self.half_extent(approach) + SPAWN_MARGIN),
        }
    }

    /// The coordinate past which vehicles on an incoming lane leave the simulation.
    pub fn exit(&self, approach: Approach) -> f64 {
        self.half_extent(approach) + EXIT_MARGIN
    }

    /// The coordinate of a stopped vehicle's centre when its front touches the stop line.
    pub fn stop_coordinate(&self) -> f64 {
        self.stop_line - 0.5 * self.vehicle_length
    }

    /// Whether a vehicle on an arrival lane with the given coordinate is inside the
    /// intersection box. The boundary counts as inside.
    pub fn in_footprint(&self, pos: f64) -> bool {
        self.footprint.contains(pos)
    }

    /// Whether a vehicle on an arrival lane with the given coordinate has reached the
    /// intersection box, whether or not it has already driven through it.
    pub fn reached_footprint(&self, pos: f64) -> bool {
        pos >= self.footprint.min
    }

    /// Maps a travel coordinate on a lane to a point in screen space.
    pub fn world_position(&self, approach: Approach, role: LaneRole, pos: f64) -> Point2d {
        let heading = approach.heading();
        let right = Vector2::new(-heading.y, heading.x);
        let lateral = right * self.lane_width * (1.0 - role.index() as f64);
        match role {
            LaneRole::Incoming => self.centre - heading * pos + lateral,
            _ => self.centre + heading * pos + lateral,
        }
    }

    /// The distance from the centre to the edge of the view along an approach.
    fn half_extent(&self, approach: Approach) -> f64 {
        if approach.is_vertical() {
            self.half_view.y
        } else {
            self.half_view.x
        }
    }
}
