//! Room coordinates, directions and range arithmetic.

use crate::types::RoomName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rooms are 50×50 tiles, coordinates 0..=49.
pub const ROOM_SIZE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub room: RoomName,
    pub x:    u8,
    pub y:    u8,
}

impl Position {
    pub fn new(room: impl Into<RoomName>, x: u8, y: u8) -> Self {
        Self { room: room.into(), x, y }
    }

    /// Chebyshev distance. `None` when the positions are in different rooms.
    pub fn range_to(&self, other: &Position) -> Option<u32> {
        if self.room != other.room {
            return None;
        }
        let dx = (self.x as i32 - other.x as i32).unsigned_abs();
        let dy = (self.y as i32 - other.y as i32).unsigned_abs();
        Some(dx.max(dy))
    }

    pub fn in_range_to(&self, other: &Position, range: u32) -> bool {
        self.range_to(other).is_some_and(|r| r <= range)
    }

    pub fn is_near_to(&self, other: &Position) -> bool {
        self.in_range_to(other, 1)
    }

    /// The adjacent tile in `direction`, or `None` if it would leave the room.
    pub fn step(&self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.offset();
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        let bound = 0..ROOM_SIZE as i32;
        if !bound.contains(&x) || !bound.contains(&y) {
            return None;
        }
        Some(Position::new(self.room.clone(), x as u8, y as u8))
    }

    /// The direction that most reduces the distance to `target`.
    pub fn direction_to(&self, target: &Position) -> Option<Direction> {
        if self.room != target.room || (self.x == target.x && self.y == target.y) {
            return None;
        }
        let dx = (target.x as i32 - self.x as i32).signum();
        let dy = (target.y as i32 - self.y as i32).signum();
        Direction::from_offset(dx, dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[room {} pos {},{}]", self.room, self.x, self.y)
    }
}

/// Eight compass directions, numbered clockwise from top as the host does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Top         = 1,
    TopRight    = 2,
    Right       = 3,
    BottomRight = 4,
    Bottom      = 5,
    BottomLeft  = 6,
    Left        = 7,
    TopLeft     = 8,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
        Direction::TopLeft,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Top         => (0, -1),
            Self::TopRight    => (1, -1),
            Self::Right       => (1, 0),
            Self::BottomRight => (1, 1),
            Self::Bottom      => (0, 1),
            Self::BottomLeft  => (-1, 1),
            Self::Left        => (-1, 0),
            Self::TopLeft     => (-1, -1),
        }
    }

    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }
}

/// One step of a precomputed path: the tile reached and the direction taken
/// to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub x:         u8,
    pub y:         u8,
    pub dx:        i8,
    pub dy:        i8,
    pub direction: Direction,
}

impl PathStep {
    /// Tile the step starts from.
    pub fn origin(&self) -> (i32, i32) {
        (self.x as i32 - self.dx as i32, self.y as i32 - self.dy as i32)
    }

    /// Steps are internally consistent when dx/dy match the direction.
    pub fn is_consistent(&self) -> bool {
        self.direction.offset() == (self.dx as i32, self.dy as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_chebyshev_within_a_room() {
        let a = Position::new("W1N1", 10, 10);
        assert_eq!(a.range_to(&Position::new("W1N1", 13, 11)), Some(3));
        assert_eq!(a.range_to(&Position::new("W2N1", 10, 10)), None);
        assert!(a.is_near_to(&Position::new("W1N1", 11, 9)));
    }

    #[test]
    fn stepping_off_the_edge_is_rejected() {
        let corner = Position::new("W1N1", 0, 0);
        assert_eq!(corner.step(Direction::TopLeft), None);
        assert_eq!(corner.step(Direction::BottomRight), Some(Position::new("W1N1", 1, 1)));
    }

    #[test]
    fn direction_numbers_match_host_constants() {
        assert_eq!(Direction::from_number(1), Some(Direction::Top));
        assert_eq!(Direction::from_number(8), Some(Direction::TopLeft));
        assert_eq!(Direction::from_number(0), None);
        assert_eq!(Direction::from_number(9), None);
    }
}
