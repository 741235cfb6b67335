//! Static direction vectors and 90° turn maps, as used by the mirror
//! opcodes `/` and `\`. Mirrors the teacher's jump-vector constants
//! (`NMI_VECTOR`, `RESET_VECTOR`, ...) in spirit: small, fixed lookup
//! tables the execution core consults, not state it owns.

/// One of the four cardinal unit vectors the instruction pointer can
/// travel in. Kept as a closed enum rather than a raw `(i64, i64)`
/// tuple so "direction is one of the four unit vectors" is a
/// compile-time invariant instead of one that must be re-checked at
/// runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// The `(dx, dy)` velocity this direction adds to the instruction
    /// pointer each step.
    #[inline]
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// 90° clockwise rotation, used by `/` (zero) and `\` (non-zero).
    #[inline]
    pub fn turn_right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// 90° counter-clockwise rotation, used by `/` (non-zero) and `\` (zero).
    #[inline]
    pub fn turn_left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// Whether this direction moves the IP along the horizontal axis
    /// (used by `|`, the vertical bridge) or the vertical axis (used
    /// by `_`, the horizontal bridge).
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }

    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

impl Default for Direction {
    /// The interpreter boots facing east, per the reset-state contract.
    fn default() -> Self {
        Direction::East
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_right_is_a_full_cycle_of_four() {
        let mut d = Direction::North;
        for _ in 0..4 {
            d = d.turn_right();
        }
        assert_eq!(d, Direction::North);
    }

    #[test]
    fn turn_left_undoes_turn_right() {
        for d in Direction::ALL {
            assert_eq!(d.turn_right().turn_left(), d);
        }
    }

    #[test]
    fn horizontal_and_vertical_are_exclusive() {
        for d in Direction::ALL {
            assert_ne!(d.is_horizontal(), d.is_vertical());
        }
    }
}
