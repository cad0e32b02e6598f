// Feedwatch: Status Panel
//
// `TextPanel` is the single text sink the poller writes into (replace or
// append).  It wraps its text to the 21x7 character grid of the OLED and,
// when the text is taller than the screen, keeps the bottom rows so an
// appended note stays visible.
//
// `FrameBuffer` is the SSD1306 memory layout (8 pages of 128 column bytes,
// LSB at the top of each page) as an embedded-graphics draw target.  The
// firmware pushes `pages()` to the panel over I2C.

use embedded_graphics::mono_font::ascii::FONT_6X9;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::config::*;

// ---------------------------------------------------------------------------
// Text panel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPanel {
    text: String,
}

impl TextPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn replace(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Wrapped rows that fit on screen.
    pub fn visible_rows(&self) -> Vec<String> {
        let rows = wrap(&self.text, TEXT_COLUMNS);
        let skip = rows.len().saturating_sub(TEXT_ROWS);
        rows.into_iter().skip(skip).collect()
    }

    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        let style = MonoTextStyle::new(&FONT_6X9, BinaryColor::On);
        for (i, row) in self.visible_rows().iter().enumerate() {
            let y = (i as u32 * TEXT_LINE_HEIGHT) as i32;
            Text::with_baseline(row, Point::new(0, y), style, Baseline::Top).draw(target)?;
        }
        Ok(())
    }
}

/// Word-wrap at `width` characters.  Explicit newlines (and blank lines) are
/// kept as rows; a word longer than a row is split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let mut row = String::new();
        let mut row_len = 0;
        for word in line.split(' ') {
            let word_len = word.chars().count();
            if row_len > 0 && row_len + 1 + word_len > width {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            if row_len > 0 {
                row.push(' ');
                row_len += 1;
            }
            for ch in word.chars() {
                if row_len == width {
                    rows.push(std::mem::take(&mut row));
                    row_len = 0;
                }
                row.push(ch);
                row_len += 1;
            }
        }
        rows.push(row);
    }
    rows
}

// ---------------------------------------------------------------------------
// Frame buffer
// ---------------------------------------------------------------------------
pub struct FrameBuffer {
    buffer: [u8; DISPLAY_BUFFER_SIZE],
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buffer: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    /// Raw GDDRAM image, page-major.
    pub fn pages(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|b| *b == 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return false;
        }
        let index = (y / 8 * SCREEN_WIDTH + x) as usize;
        self.buffer[index] & (1 << (y % 8)) != 0
    }

    fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        let index = (y / 8 * SCREEN_WIDTH + x) as usize;
        let mask = 1 << (y % 8);
        if on {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Text running off the right edge is clipped here.
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(if color.is_on() { 0xFF } else { 0x00 });
        Ok(())
    }
}
