//! Spatial keys for the shared canvas grid.
//!
//! A cell `(x, y)` on a grid whose axes run `0..=max_value` is packed into a
//! single integer: `x` occupies the high bits and `y` the low `n` bits, where
//! `max_value = 2^n - 1`. Keys are `u64`, so each axis is limited to 32 bits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Widest axis a `u64` key can hold.
pub const MAX_AXIS_BITS: u32 = 32;

/// Most cells a single [`SpatialKeyCodec::keys_in_box`] call will list.
pub const MAX_BOX_CELLS: u64 = 1 << 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("max value {max_value} must be of the form 2^n - 1 with 1 <= n <= 32 (e.g. 1023, 2047)")]
    InvalidRangeSpec { max_value: u64 },

    #[error("coordinates ({x}, {y}) must both be in the range 0 to {max_value}")]
    CoordinateOutOfBounds { x: i64, y: i64, max_value: u64 },

    #[error("key {key} does not belong to a grid with max value {max_value}")]
    KeyOutOfRange { key: u64, max_value: u64 },

    #[error("box corner ({left}, {top}) lies past ({right}, {bottom})")]
    InvertedBox {
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    },

    #[error("box covers {cells} cells, more than the limit of {limit}")]
    BoxTooLarge { cells: u64, limit: u64 },
}

/// A cell position that has already been checked against a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

/// Codec bound to one grid size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialKeyCodec {
    max_value: u64,
    bits: u32,
}

impl SpatialKeyCodec {
    /// Validate `max_value` once and keep the bit width around.
    pub fn new(max_value: u64) -> Result<Self, KeyError> {
        let bits = bit_width(max_value)?;
        Ok(Self { max_value, bits })
    }

    pub fn max_value(&self) -> u64 {
        self.max_value
    }

    /// Bits used per axis
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of distinct keys on this grid, `(max_value + 1)^2`.
    pub fn key_space(&self) -> u128 {
        1u128 << (2 * self.bits)
    }

    pub fn cell(&self, x: i64, y: i64) -> Result<Cell, KeyError> {
        let in_range = |v: i64| v >= 0 && (v as u64) <= self.max_value;
        if !in_range(x) || !in_range(y) {
            return Err(KeyError::CoordinateOutOfBounds {
                x,
                y,
                max_value: self.max_value,
            });
        }
        Ok(Cell {
            x: x as u32,
            y: y as u32,
        })
    }

    pub fn encode(&self, x: i64, y: i64) -> Result<u64, KeyError> {
        let cell = self.cell(x, y)?;
        Ok(self.encode_cell(cell))
    }

    pub fn encode_cell(&self, cell: Cell) -> u64 {
        ((cell.x as u64) << self.bits) | cell.y as u64
    }

    pub fn decode(&self, key: u64) -> Result<Cell, KeyError> {
        if (key as u128) >= self.key_space() {
            return Err(KeyError::KeyOutOfRange {
                key,
                max_value: self.max_value,
            });
        }
        Ok(Cell {
            x: (key >> self.bits) as u32,
            y: (key & self.max_value) as u32,
        })
    }

    /// Keys of every cell in the inclusive box, row by row.
    ///
    /// Both corners are validated before anything is produced, so a box
    /// reaching off the grid fails as a whole. Boxes larger than
    /// [`MAX_BOX_CELLS`] are rejected with `BoxTooLarge`.
    pub fn keys_in_box(
        &self,
        upper_left: (i64, i64),
        lower_right: (i64, i64),
    ) -> Result<Vec<u64>, KeyError> {
        let top_left = self.cell(upper_left.0, upper_left.1)?;
        let bottom_right = self.cell(lower_right.0, lower_right.1)?;

        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return Err(KeyError::InvertedBox {
                left: upper_left.0,
                top: upper_left.1,
                right: lower_right.0,
                bottom: lower_right.1,
            });
        }

        let width = bottom_right.x as u64 - top_left.x as u64 + 1;
        let height = bottom_right.y as u64 - top_left.y as u64 + 1;
        let cells = width.saturating_mul(height);
        if cells > MAX_BOX_CELLS {
            return Err(KeyError::BoxTooLarge {
                cells,
                limit: MAX_BOX_CELLS,
            });
        }

        let mut keys = Vec::with_capacity(cells as usize);
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                keys.push(self.encode_cell(Cell { x, y }));
            }
        }
        Ok(keys)
    }
}

/// Pack `(x, y)` into a key for a grid with axes `0..=max_value`.
pub fn encode(x: i64, y: i64, max_value: u64) -> Result<u64, KeyError> {
    SpatialKeyCodec::new(max_value)?.encode(x, y)
}

/// Recover `(x, y)` from a key produced by [`encode`] with the same `max_value`.
pub fn decode(key: u64, max_value: u64) -> Result<(u32, u32), KeyError> {
    let cell = SpatialKeyCodec::new(max_value)?.decode(key)?;
    Ok((cell.x, cell.y))
}

fn bit_width(max_value: u64) -> Result<u32, KeyError> {
    let invalid = KeyError::InvalidRangeSpec { max_value };
    let size = max_value.checked_add(1).ok_or_else(|| invalid.clone())?;
    if max_value == 0 || !size.is_power_of_two() {
        return Err(invalid);
    }
    let bits = size.trailing_zeros();
    if bits > MAX_AXIS_BITS {
        return Err(invalid);
    }
    Ok(bits)
}
