//! Cube coordinates for a hexagonal lattice.
//!
//! A hex cell is addressed by an integer triple `(x, y, z)` restricted to the
//! plane `x + y + z = 0`. Only two components are stored; `z` is derived, so
//! a `Cube` can never leave the plane.

use crate::error::LatticeError;
use serde::{Deserialize, Serialize};

const ROOT3_2: f64 = 0.866_025_403_784_438_6; // sqrt(3) / 2

/// The six unit steps, paired so that `OFFSETS[i]` and `OFFSETS[i ^ 1]` are
/// opposite directions.
pub const OFFSETS: [(i32, i32, i32); 6] = [
    (0, -1, 1),
    (0, 1, -1),
    (1, 0, -1),
    (-1, 0, 1),
    (-1, 1, 0),
    (1, -1, 0),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i32; 3]", into = "[i32; 3]")]
pub struct Cube {
    x: i32,
    y: i32,
}

impl Cube {
    pub const ORIGIN: Cube = Cube { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn try_from_xyz(x: i32, y: i32, z: i32) -> Result<Self, LatticeError> {
        if x + y + z != 0 {
            return Err(LatticeError::OffPlane { x, y, z });
        }
        Ok(Self { x, y })
    }

    pub fn x(self) -> i32 {
        self.x
    }

    pub fn y(self) -> i32 {
        self.y
    }

    pub fn z(self) -> i32 {
        -self.x - self.y
    }

    pub fn xyz(self) -> (i32, i32, i32) {
        (self.x, self.y, self.z())
    }

    /// Distance from the origin in hex steps.
    pub fn ring(self) -> i32 {
        self.x.abs().max(self.y.abs()).max(self.z().abs())
    }

    pub fn offset(self, (dx, dy, dz): (i32, i32, i32)) -> Self {
        debug_assert_eq!(dx + dy + dz, 0);
        Self::new(self.x + dx, self.y + dy)
    }

    /// All six adjacent coordinates, whether or not they belong to any lattice.
    pub fn neighbors(self) -> [Cube; 6] {
        OFFSETS.map(|o| self.offset(o))
    }

    /// Planar projection used for drawing: `(0.5 * (x - y), sqrt(3)/2 * z)`.
    pub fn to_cartesian(self) -> (f64, f64) {
        (0.5 * f64::from(self.x - self.y), ROOT3_2 * f64::from(self.z()))
    }
}

impl TryFrom<[i32; 3]> for Cube {
    type Error = LatticeError;

    fn try_from([x, y, z]: [i32; 3]) -> Result<Self, Self::Error> {
        Cube::try_from_xyz(x, y, z)
    }
}

impl From<Cube> for [i32; 3] {
    fn from(c: Cube) -> Self {
        [c.x, c.y, c.z()]
    }
}

/// Every coordinate of the hexagonal disc of side `radius`, in x-major order.
pub fn hex_disc(radius: i32) -> impl Iterator<Item = Cube> {
    (-radius..=radius).flat_map(move |x| {
        let lo = (-radius).max(-x - radius);
        let hi = radius.min(-x + radius);
        (lo..=hi).map(move |y| Cube::new(x, y))
    })
}

/// Number of cells in a disc of side `radius`: the centered hexagonal number.
pub fn hex_count(radius: i32) -> usize {
    let r = radius.max(0) as usize;
    3 * r * r + 3 * r + 1
}
