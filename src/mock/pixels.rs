use std::convert::Infallible;

use crate::{Color, PixelBuffer};

/// In-memory pixel buffer for development and testing.
///
/// Keeps every written color and counts how often it was flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPixels {
    colors: Vec<Color>,
    shows: usize,
}

impl MemoryPixels {
    /// Create a strip of `len` dark lights.
    pub fn new(len: usize) -> Self {
        Self {
            colors: vec![Color::default(); len],
            shows: 0,
        }
    }

    /// Every buffered color in wiring order.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of times [`PixelBuffer::show`] was called.
    pub fn shows(&self) -> usize {
        self.shows
    }

    /// Indices of every light that is not dark.
    pub fn lit(&self) -> Vec<usize> {
        self.colors
            .iter()
            .enumerate()
            .filter(|(_, color)| **color != Color::default())
            .map(|(index, _)| index)
            .collect()
    }
}

impl PixelBuffer for MemoryPixels {
    type Error = Infallible;

    fn len(&self) -> usize {
        self.colors.len()
    }

    fn get(&self, index: usize) -> Color {
        self.colors[index]
    }

    fn set(&mut self, index: usize, color: Color) {
        self.colors[index] = color;
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        self.shows += 1;
        Ok(())
    }
}
