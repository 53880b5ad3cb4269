use std::io::{self, Write};

use crate::blend::{self, ChannelRounding};
use crate::layout::{RowLayout, map_zigzag};
use crate::{Color, PixelBuffer};

/// Character cells across the preview.
const GRID_WIDTH: usize = 41;

/// Character rows down the preview.
const GRID_HEIGHT: usize = 13;

/// Terminal preview of the ceiling for development and testing.
///
/// Every [`PixelBuffer::show`] redraws the ceiling in place as an ANSI
/// true-colour grid, with each light drawn at its estimated position and
/// scaled by the preview brightness.
#[derive(Debug)]
pub struct TerminalPixels<W = io::Stdout> {
    out: W,
    colors: Vec<Color>,
    /// Grid cell of every light, in wiring order.
    cells: Vec<(usize, usize)>,
    brightness: u8,
}

impl TerminalPixels<io::Stdout> {
    /// Preview `layout` on standard output.
    pub fn stdout(layout: &RowLayout) -> Self {
        Self::new(io::stdout(), layout)
    }
}

impl<W: Write> TerminalPixels<W> {
    pub fn new(out: W, layout: &RowLayout) -> Self {
        let cells = map_zigzag(layout)
            .iter()
            .map(|led| {
                let col = (led.x() * (GRID_WIDTH - 1) as f32).round() as usize;
                // Terminal rows grow downwards, ceiling y grows upwards.
                let row = ((1.0 - led.y()) * (GRID_HEIGHT - 1) as f32).round() as usize;
                (row.min(GRID_HEIGHT - 1), col.min(GRID_WIDTH - 1))
            })
            .collect();

        Self {
            out,
            colors: vec![Color::default(); layout.total()],
            cells,
            brightness: u8::MAX,
        }
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Merge every light into its grid cell. Lights sharing a cell show the
    /// brightest channels among them.
    fn grid(&self) -> Vec<Vec<Option<Color>>> {
        let factor = f32::from(self.brightness) / f32::from(u8::MAX);
        let mut grid = vec![vec![None; GRID_WIDTH]; GRID_HEIGHT];
        for (&(row, col), &color) in self.cells.iter().zip(&self.colors) {
            let color = blend::scale(color, factor, ChannelRounding::Truncate);
            let cell = &mut grid[row][col];
            *cell = Some(cell.map_or(color, |other| blend::merge_max(other, color)));
        }
        grid
    }
}

/// Error type for terminal preview operations.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

impl<W: Write> PixelBuffer for TerminalPixels<W> {
    type Error = DisplayError;

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
        let grid = self.grid();
        render_grid(&mut self.out, &grid)
    }
}

/// Render a preview grid to any writer. Extracted for testability.
fn render_grid(w: &mut impl Write, grid: &[Vec<Option<Color>>]) -> Result<(), DisplayError> {
    // Home the cursor so each frame overwrites the previous one.
    write!(w, "\x1b[H")?;
    for row in grid {
        for cell in row {
            write!(w, "{}", format_cell(*cell))?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

/// Map a grid cell to its character: blank without a light, a dot for a
/// dark light and a coloured disc for a lit one.
fn format_cell(cell: Option<Color>) -> String {
    match cell {
        None => " ".to_owned(),
        Some(color) if color == Color::default() => "·".to_owned(),
        Some(Color { r, g, b }) => format!("\x1b[38;2;{r};{g};{b}m●\x1b[0m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RowLayout {
        RowLayout::new(vec![20, 40, 20]).unwrap()
    }

    fn render_to_string(pixels: &mut TerminalPixels<Vec<u8>>) -> String {
        pixels.show().expect("rendering to buffer should succeed");
        let out = std::mem::take(&mut pixels.out);
        String::from_utf8(out).expect("output should be valid UTF-8")
    }

    #[test]
    fn dark_ceiling_has_no_colour_codes() {
        let mut pixels = TerminalPixels::new(Vec::new(), &layout());
        let output = render_to_string(&mut pixels);

        assert!(output.starts_with("\x1b[H"));
        assert_eq!(output.lines().count(), GRID_HEIGHT);
        assert!(output.contains('·'), "dark lights should be drawn as dots");
        assert!(!output.contains("\x1b[38;2;"));
    }

    #[test]
    fn lit_light_uses_true_colour() {
        let mut pixels = TerminalPixels::new(Vec::new(), &layout());
        pixels.set(0, Color::new(255, 0, 0));
        let output = render_to_string(&mut pixels);

        assert!(
            output.contains("\x1b[38;2;255;0;0m●"),
            "red light should use a red foreground"
        );
    }

    #[test]
    fn first_light_is_bottom_left() {
        let mut pixels = TerminalPixels::new(Vec::new(), &layout());
        pixels.set(0, Color::new(0, 255, 0));
        let output = render_to_string(&mut pixels);

        let last_row = output.lines().last().expect("grid has rows");
        assert!(last_row.starts_with("\x1b[38;2;0;255;0m●"));
    }

    #[test]
    fn brightness_scales_output() {
        let mut pixels = TerminalPixels::new(Vec::new(), &layout()).with_brightness(0);
        pixels.fill(Color::new(255, 255, 255));
        let output = render_to_string(&mut pixels);

        assert!(!output.contains("\x1b[38;2;"));
        assert_eq!(pixels.get(5), Color::new(255, 255, 255));
    }

    #[test]
    fn show_writes_every_frame() {
        let mut pixels = TerminalPixels::new(Vec::new(), &layout());
        pixels.show().unwrap();
        pixels.show().unwrap();

        let output = String::from_utf8(pixels.into_writer()).unwrap();
        assert_eq!(output.matches("\x1b[H").count(), 2);
    }
}
