//! Board squares in algebraic coordinates

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shakmaty::{attacks, File, Rank};
use std::fmt;
use std::str::FromStr;

/// Number of files/ranks
pub const BOARD_SIZE: i8 = 8;

/// A board square. File 0 = a, rank 0 = 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(shakmaty::Square);

impl Square {
    /// Build a square, `None` when off the board
    pub fn new(file: i8, rank: i8) -> Option<Self> {
        if (0..BOARD_SIZE).contains(&file) && (0..BOARD_SIZE).contains(&rank) {
            let file = File::new(file as u32);
            let rank = Rank::new(rank as u32);
            Some(Self(shakmaty::Square::from_coords(file, rank)))
        } else {
            None
        }
    }

    /// Square from a 0..64 index (a1 = 0, h8 = 63)
    pub fn from_index(index: usize) -> Option<Self> {
        shakmaty::Square::try_from(index as u32).ok().map(Self)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn file(self) -> i8 {
        u32::from(self.0.file()) as i8
    }

    pub fn rank(self) -> i8 {
        u32::from(self.0.rank()) as i8
    }

    /// Square shifted by (file, rank) deltas
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        Self::new(self.file() + df, self.rank() + dr)
    }

    /// True when `other` is a knight's jump away
    pub fn is_knight_jump(self, other: Square) -> bool {
        attacks::knight_attacks(self.0).contains(other.0)
    }

    /// All 64 squares, a1 first
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).filter_map(Square::from_index)
    }
}

impl From<shakmaty::Square> for Square {
    fn from(square: shakmaty::Square) -> Self {
        Self(square)
    }
}

impl From<Square> for shakmaty::Square {
    fn from(square: Square) -> Self {
        square.0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for unparseable square names
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid square: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<shakmaty::Square>()
            .map(Self)
            .map_err(|_| ParseSquareError(s.to_string()))
    }
}

// Squares travel as "e4" on the wire
impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
