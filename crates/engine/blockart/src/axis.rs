use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build orientation used to group placement commands
///
/// The axis only changes the order coordinates are written in, never which
/// block a pixel resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Emission order for axis-grouped output
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Reorder a position for this axis
    ///
    /// `X` and `Y` keep the base orientation, `Z` swaps the second and third
    /// coordinate. Applying the same axis twice restores the input.
    pub fn orient(self, pos: IVec3) -> IVec3 {
        match self {
            Axis::X | Axis::Y => pos,
            Axis::Z => IVec3::new(pos.x, pos.z, pos.y),
        }
    }

    /// Create from char (x/X, y/Y, z/Z)
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' | 'X' => Some(Axis::X),
            'y' | 'Y' => Some(Axis::Y),
            'z' | 'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
