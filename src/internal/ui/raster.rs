//! Half-block rendering of RGBA frames into terminal cells.
//!
//! Each cell shows two vertically stacked pixels: `▀` in the top pixel's color on
//! the bottom pixel's background.

use image::{Rgba, RgbaImage};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

const UPPER_HALF_BLOCK: &str = "▀";

/// Where a frame lands inside a terminal area, aspect ratio preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterLayout {
    /// Cells covered by the frame.
    pub rect: Rect,
    frame_width: u32,
    frame_height: u32,
}

impl RasterLayout {
    pub fn new(area: Rect, frame: (u32, u32)) -> Self {
        let (fw, fh) = frame;
        if fw == 0 || fh == 0 || area.width == 0 || area.height == 0 {
            return Self {
                rect: Rect::new(area.x, area.y, 0, 0),
                frame_width: fw,
                frame_height: fh,
            };
        }

        // Half blocks make cells roughly square: rows count double
        let scale = (area.width as f64 / fw as f64).min(area.height as f64 * 2.0 / fh as f64);
        let width = ((fw as f64 * scale).round() as u16).clamp(1, area.width);
        let height = ((fh as f64 * scale / 2.0).round() as u16).clamp(1, area.height);

        Self {
            rect: Rect::new(
                area.x + (area.width - width) / 2,
                area.y + (area.height - height) / 2,
                width,
                height,
            ),
            frame_width: fw,
            frame_height: fh,
        }
    }

    /// Frame pixels per terminal column.
    pub fn pixels_per_column(&self) -> f32 {
        match self.rect.width {
            0 => 0.0,
            w => self.frame_width as f32 / w as f32,
        }
    }

    /// Frame x under the center of terminal `column`.
    pub fn frame_x(&self, column: u16) -> f32 {
        (column as f32 - self.rect.x as f32 + 0.5) * self.pixels_per_column()
    }

    /// Terminal column showing frame x, if it is on screen.
    pub fn column_of(&self, frame_x: f32) -> Option<u16> {
        let ppc = self.pixels_per_column();
        if ppc <= 0.0 || frame_x < 0.0 || frame_x >= self.frame_width as f32 {
            return None;
        }
        Some(self.rect.x + (frame_x / ppc) as u16)
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.rect.x
            && column < self.rect.x + self.rect.width
            && row >= self.rect.y
            && row < self.rect.y + self.rect.height
    }

    fn sample_y(&self, half_row: u32) -> u32 {
        let rows = self.rect.height as u32 * 2;
        (((half_row as f64 + 0.5) * self.frame_height as f64 / rows as f64) as u32)
            .min(self.frame_height.saturating_sub(1))
    }

    fn sample_x(&self, col: u32) -> u32 {
        (((col as f64 + 0.5) * self.frame_width as f64 / self.rect.width as f64) as u32)
            .min(self.frame_width.saturating_sub(1))
    }
}

/// Draws a frame with nearest-neighbour sampling.
pub struct RasterView<'a> {
    frame: &'a RgbaImage,
}

impl<'a> RasterView<'a> {
    pub fn new(frame: &'a RgbaImage) -> Self {
        Self { frame }
    }
}

impl Widget for RasterView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = RasterLayout::new(area, self.frame.dimensions());
        let rect = layout.rect;

        for row in 0..rect.height {
            for col in 0..rect.width {
                let x = layout.sample_x(col as u32);
                let top = layout.sample_y(row as u32 * 2);
                let bottom = layout.sample_y(row as u32 * 2 + 1);

                if let Some(cell) = buf.cell_mut((rect.x + col, rect.y + row)) {
                    cell.set_symbol(UPPER_HALF_BLOCK)
                        .set_fg(to_color(self.frame.get_pixel(x, top)))
                        .set_bg(to_color(self.frame.get_pixel(x, bottom)));
                }
            }
        }
    }
}

// Premultiplied onto black; terminals have no alpha.
fn to_color(pixel: &Rgba<u8>) -> Color {
    let a = pixel[3] as u16;
    let channel = |c: u8| ((c as u16 * a + 127) / 255) as u8;
    Color::Rgb(channel(pixel[0]), channel(pixel[1]), channel(pixel[2]))
}
