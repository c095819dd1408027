use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use ufmt_write::uWrite;

use crate::{
    cgram_command, cursor_command, delays, frame, string_bytes, Commands, Mode, RowAddr,
    CLEAR_WIDTH, DEFAULT_ADDRESS,
};

/// API to write to the LCD.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    address: u8,
    delay: &'a mut D,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
        }
    }

    /// Set the 7-bit I2C address, defaults to [`DEFAULT_ADDRESS`].
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Initializes the hardware.
    ///
    /// Brings the controller from any power-on state into 4-bit mode with two lines, a 5x8 font,
    /// an incrementing cursor and the display on. The three 8-bit function sets are the
    /// datasheet's "initialization by instruction" and must not be skipped, some clones never
    /// converge otherwise.
    pub fn init(mut self) -> Result<Self, I::Error> {
        self.reinit()?;
        Ok(self)
    }

    /// Runs the power-on sequence again, e.g. after a failed transmission left the controller
    /// with half a byte latched.
    pub fn reinit(&mut self) -> Result<(), I::Error> {
        debug!("init lcd at {=u8:#x}", self.address);
        // Initial delay to wait for init after power on.
        self.delay.delay_ms(delays::POWER_ON);

        for &wait in delays::INIT_8BIT.iter() {
            self.send_command(Commands::Init8Bit as u8)?;
            self.delay.delay_ms(wait);
        }

        self.send_command(Commands::Init4Bit as u8)?;
        self.delay.delay_ms(delays::INIT_4BIT);

        self.send_command(Commands::FunctionSet as u8)?;
        self.delay.delay_ms(delays::COMMAND);
        self.send_command(Commands::DisplayOff as u8)?;
        self.delay.delay_ms(delays::COMMAND);
        self.send_command(Commands::ClearDisplay as u8)?;
        // clear takes longer than the other instructions
        self.delay.delay_ms(delays::COMMAND);
        self.delay.delay_ms(delays::COMMAND);
        self.send_command(Commands::EntryModeSet as u8)?;
        self.delay.delay_ms(delays::COMMAND);
        self.send_command(Commands::DisplayOn as u8)
    }

    fn send(&mut self, data: u8, mode: Mode) -> Result<(), I::Error> {
        let buf = frame(data, mode);
        trace!("{} {=u8:#x} -> {=[u8]:#x}", mode, data, &buf[..]);
        self.i2c.write(self.address, &buf)
    }

    /// Send one instruction byte.
    pub fn send_command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, Mode::Cmd)
    }

    /// Send one byte to DDRAM or CGRAM, whichever the address counter points into.
    pub fn send_data(&mut self, data: u8) -> Result<(), I::Error> {
        self.send(data, Mode::Data)
    }

    /// Blank the first row by homing the cursor and writing [`CLEAR_WIDTH`] spaces.
    ///
    /// Does not use the controller's clear instruction; the cursor is left after the last
    /// written cell.
    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.send_command(RowAddr::First as u8)?;
        for _ in 0..CLEAR_WIDTH {
            self.send_data(b' ')?;
        }
        Ok(())
    }

    /// Set the cursor to (row, col). Coordinates are zero-based, only rows 0 and 1 exist.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), I::Error> {
        self.send_command(cursor_command(row, col))
    }

    /// Write string to display, stopping at the first NUL byte.
    ///
    /// Bytes are sent as-is and there is no wrapping, the controller's address counter decides
    /// where overflowing characters land.
    pub fn send_string(&mut self, text: &str) -> Result<(), I::Error> {
        for b in string_bytes(text) {
            self.send_data(b)?;
        }
        Ok(())
    }

    /// Shift the whole display one cell to the left.
    pub fn scroll_left(&mut self) -> Result<(), I::Error> {
        self.send_command(Commands::ShiftDisplayLeft as u8)
    }

    /// Shift the whole display one cell to the right.
    pub fn scroll_right(&mut self) -> Result<(), I::Error> {
        self.send_command(Commands::ShiftDisplayRight as u8)
    }

    /// Store a 5x8 glyph in one of the eight CGRAM slots. Print it with `send_data(location)`.
    ///
    /// Leaves the address counter in CGRAM, call [`Self::set_cursor`] before writing text.
    pub fn create_char(&mut self, location: u8, pattern: &[u8; 8]) -> Result<(), I::Error> {
        self.send_command(cgram_command(location))?;
        for row in pattern {
            self.send_data(*row)?;
        }
        Ok(())
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = I::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.send_string(s)
    }
}
