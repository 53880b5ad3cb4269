use std::fmt;
use std::ops::Range;

use thiserror::Error;

use super::StrategyKind;

/// A logical address handed to the active strategy.
///
/// Which shapes a strategy accepts depends on the strategy; anything else is
/// rejected with [`KeyError::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Key {
    /// Single strip index, or a whole row under row addressing.
    Index(i64),
    /// Strip indices `start..stop` every `step`. Missing bounds default to the
    /// whole strip and a missing step to `1`.
    Range {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    Cell { row: i64, col: i64 },
    /// Point in the unit square.
    Point { x: f32, y: f32 },
    /// Axis-aligned box spanned by two corners, in any order.
    Area { from: (f32, f32), to: (f32, f32) },
    /// Radius from the polar origin and angle in degrees.
    Polar { radius: f32, angle: f32 },
    /// Filled circle in unit-square coordinates, independent of any origin.
    Fill { x: f32, y: f32, radius: f32 },
}

impl Key {
    pub const fn index(index: i64) -> Self {
        Self::Index(index)
    }

    pub const fn range(start: i64, stop: i64, step: i64) -> Self {
        Self::Range {
            start: Some(start),
            stop: Some(stop),
            step: Some(step),
        }
    }

    /// Every light on the strip.
    pub const fn all() -> Self {
        Self::Range {
            start: None,
            stop: None,
            step: None,
        }
    }

    pub const fn cell(row: i64, col: i64) -> Self {
        Self::Cell { row, col }
    }

    pub const fn point(x: f32, y: f32) -> Self {
        Self::Point { x, y }
    }

    pub const fn area(from: (f32, f32), to: (f32, f32)) -> Self {
        Self::Area { from, to }
    }

    pub const fn polar(radius: f32, angle: f32) -> Self {
        Self::Polar { radius, angle }
    }

    pub const fn fill(x: f32, y: f32, radius: f32) -> Self {
        Self::Fill { x, y, radius }
    }

    pub const fn shape(&self) -> KeyShape {
        match self {
            Self::Index(_) => KeyShape::Index,
            Self::Range { .. } => KeyShape::Range,
            Self::Cell { .. } => KeyShape::Cell,
            Self::Point { .. } => KeyShape::Point,
            Self::Area { .. } => KeyShape::Area,
            Self::Polar { .. } => KeyShape::Polar,
            Self::Fill { .. } => KeyShape::Fill,
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Self::Index(index.into())
    }
}

impl From<Range<i64>> for Key {
    fn from(range: Range<i64>) -> Self {
        Self::Range {
            start: Some(range.start),
            stop: Some(range.end),
            step: None,
        }
    }
}

impl From<(i64, i64)> for Key {
    fn from((row, col): (i64, i64)) -> Self {
        Self::Cell { row, col }
    }
}

impl From<(i32, i32)> for Key {
    fn from((row, col): (i32, i32)) -> Self {
        Self::Cell {
            row: row.into(),
            col: col.into(),
        }
    }
}

impl From<(f32, f32)> for Key {
    fn from((x, y): (f32, f32)) -> Self {
        Self::Point { x, y }
    }
}

impl From<(f64, f64)> for Key {
    fn from((x, y): (f64, f64)) -> Self {
        Self::Point {
            x: x as f32,
            y: y as f32,
        }
    }
}

/// Shape of a [`Key`] without its values, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    Index,
    Range,
    Cell,
    Point,
    Area,
    Polar,
    Fill,
}

impl fmt::Display for KeyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Index => "index",
            Self::Range => "range",
            Self::Cell => "(row, col)",
            Self::Point => "point",
            Self::Area => "area",
            Self::Polar => "(radius, angle)",
            Self::Fill => "(x, y, radius)",
        })
    }
}

/// Whether a key was used to read or to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Get,
    Set,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::Set => "set",
        })
    }
}

/// A key the active strategy cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("{strategy} addressing cannot {access} a {shape} key")]
    Unsupported {
        strategy: StrategyKind,
        access: Access,
        shape: KeyShape,
    },
    #[error("range step cannot be zero")]
    ZeroStep,
}

impl KeyError {
    pub(crate) fn unsupported(strategy: StrategyKind, access: Access, key: &Key) -> Self {
        Self::Unsupported {
            strategy,
            access,
            shape: key.shape(),
        }
    }
}
