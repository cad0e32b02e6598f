// Feedwatch: SSD1306 OLED Driver
//
// Register-level driver over I2C.  Drawing happens in the portable
// `FrameBuffer`; this module only pushes the buffer to the panel.

use esp_idf_hal::i2c::I2cDriver;

use feedwatch::config::*;
use feedwatch::display::{FrameBuffer, TextPanel};

// Control bytes
const CTRL_COMMAND: u8 = 0x00;
const CTRL_DATA: u8 = 0x40;

// Commands
const CMD_DISPLAY_OFF: u8 = 0xAE;
const CMD_DISPLAY_ON: u8 = 0xAF;
const CMD_SET_COLUMN_ADDR: u8 = 0x21;
const CMD_SET_PAGE_ADDR: u8 = 0x22;
const CMD_NOP: u8 = 0xE3;

/// 128x64 init sequence, horizontal addressing, internal charge pump.
const INIT_SEQUENCE: &[u8] = &[
    CMD_DISPLAY_OFF,
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1,       // segment remap
    0xC8,       // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH
    0xA4,       // resume from RAM
    0xA6,       // normal (not inverted)
    CMD_DISPLAY_ON,
];

pub struct OledDisplay {
    i2c: I2cDriver<'static>,
    frame: FrameBuffer,
}

impl OledDisplay {
    pub fn new(i2c: I2cDriver<'static>) -> Self {
        Self {
            i2c,
            frame: FrameBuffer::new(),
        }
    }

    /// The panel ACKs its address.
    pub fn is_connected(&mut self) -> bool {
        self.command(&[CMD_NOP]).is_ok()
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        self.command(INIT_SEQUENCE)?;
        self.show_panel(&TextPanel::new())?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    /// Render the text panel and push it to the screen.
    pub fn show_panel(&mut self, panel: &TextPanel) -> anyhow::Result<()> {
        panel.draw(&mut self.frame).unwrap_or_else(|never| match never {});
        self.flush()
    }

    pub fn turn_off(&mut self) -> anyhow::Result<()> {
        self.command(&[CMD_DISPLAY_OFF])
    }

    fn command(&mut self, commands: &[u8]) -> anyhow::Result<()> {
        for &cmd in commands {
            self.i2c.write(I2C_ADDR_OLED, &[CTRL_COMMAND, cmd], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        let last_column = (SCREEN_WIDTH - 1) as u8;
        let last_page = (SCREEN_HEIGHT / 8 - 1) as u8;
        self.command(&[CMD_SET_COLUMN_ADDR, 0, last_column, CMD_SET_PAGE_ADDR, 0, last_page])?;

        // One I2C transaction per page: control byte + 128 column bytes.
        let mut packet = [0u8; SCREEN_WIDTH as usize + 1];
        packet[0] = CTRL_DATA;
        for page in self.frame.pages().chunks(SCREEN_WIDTH as usize) {
            packet[1..].copy_from_slice(page);
            self.i2c.write(I2C_ADDR_OLED, &packet, I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }
}
