use std::ops::Range;

use crate::config::ConfigError;

/// A single light with its estimated position in the unit square.
///
/// Positions come from [`map_zigzag`] and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Led {
    index: usize,
    x: f32,
    y: f32,
}

impl Led {
    #[inline]
    pub const fn new(index: usize, x: f32, y: f32) -> Self {
        Self { index, x, y }
    }

    /// Position in the physical wiring order.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub const fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance from this light to `(x, y)`.
    #[inline]
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Number of lights on each physical row, in wiring order.
///
/// Row 0 is the row nearest the data connector. Even rows run horizontally
/// left to right, odd rows run diagonally back from right to left:
///
/// ```text
///   ---> n
///    \
///     \
/// 0  ---->
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    rows: Vec<usize>,
    /// `starts[i]` is the strip index of the first light in row `i`.
    starts: Vec<usize>,
    total: usize,
}

impl RowLayout {
    /// Validate a per-row light count sequence.
    ///
    /// Every row must hold at least one light and there must be at least one row.
    pub fn new(rows: impl Into<Vec<usize>>) -> Result<Self, ConfigError> {
        let rows = rows.into();
        if rows.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }
        if let Some(row) = rows.iter().position(|&count| count == 0) {
            return Err(ConfigError::EmptyRow { row });
        }

        let starts = rows
            .iter()
            .scan(0, |next, &count| {
                let start = *next;
                *next += count;
                Some(start)
            })
            .collect();
        let total = rows.iter().sum();

        Ok(Self {
            rows,
            starts,
            total,
        })
    }

    /// Light counts per row.
    #[inline]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of lights across all rows.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Convert a `(row, col)` pair into a strip index.
    ///
    /// Rows wrap modulo the row count and the result wraps modulo the light
    /// count. Odd rows are wired right to left, so their columns are counted
    /// back from the row length.
    pub fn row_col_to_index(&self, row: i64, col: i64) -> usize {
        let row = wrap(row, self.rows.len());
        let col = wrap(col, self.total) as i64;
        let offset = if row % 2 == 0 {
            col
        } else {
            self.rows[row] as i64 - col
        };
        wrap(self.starts[row] as i64 + offset, self.total)
    }

    /// Strip indices of every light on `row`, which wraps modulo the row count.
    pub fn row_span(&self, row: i64) -> Range<usize> {
        let row = wrap(row, self.rows.len());
        self.starts[row]..self.starts[row] + self.rows[row]
    }

    /// Row that the light at strip index `index` belongs to.
    pub fn row_of(&self, index: usize) -> Option<usize> {
        if index >= self.total {
            return None;
        }
        Some(self.starts.partition_point(|&start| start <= index) - 1)
    }
}

/// Wrap a signed index into `0..len`.
#[inline]
pub(crate) fn wrap(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// Estimate the position of every light from its row layout.
///
/// With `r` rows the row height is `1 / floor(r / 2)` (or `1` for a single
/// row). Light `j` of an `n`-light row `i` is placed at:
/// - even `i`: `(j / n, (i / 2) * row_height)`
/// - odd `i`: `(1 - j / n, (i // 2) * row_height + (j / n) * row_height)`
///
/// The returned lights are in wiring order, so `leds[k].index() == k`.
pub fn map_zigzag(layout: &RowLayout) -> Vec<Led> {
    let row_height = match layout.row_count() {
        1 => 1.0,
        count => 1.0 / (count / 2) as f32,
    };

    let mut leds = Vec::with_capacity(layout.total());
    for (i, &count) in layout.rows().iter().enumerate() {
        for j in 0..count {
            let along = j as f32 / count as f32;
            let (x, y) = if i % 2 == 0 {
                (along, (i as f32 / 2.0) * row_height)
            } else {
                (1.0 - along, (i / 2) as f32 * row_height + along * row_height)
            };
            leds.push(Led::new(leds.len(), x, y));
        }
    }
    leds
}
