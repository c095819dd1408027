use embedded_hal_async::{delay::DelayNs, i2c::I2c};

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

    /// Initializes the hardware, see [`crate::sync_lcd::Lcd::init`].
    pub async fn init(mut self) -> Result<Self, I::Error> {
        self.reinit().await?;
        Ok(self)
    }

    /// Runs the power-on sequence again.
    pub async fn reinit(&mut self) -> Result<(), I::Error> {
        debug!("init lcd at {=u8:#x}", self.address);
        self.delay.delay_ms(delays::POWER_ON).await;

        for &wait in delays::INIT_8BIT.iter() {
            self.send_command(Commands::Init8Bit as u8).await?;
            self.delay.delay_ms(wait).await;
        }

        self.send_command(Commands::Init4Bit as u8).await?;
        self.delay.delay_ms(delays::INIT_4BIT).await;

        self.send_command(Commands::FunctionSet as u8).await?;
        self.delay.delay_ms(delays::COMMAND).await;
        self.send_command(Commands::DisplayOff as u8).await?;
        self.delay.delay_ms(delays::COMMAND).await;
        self.send_command(Commands::ClearDisplay as u8).await?;
        self.delay.delay_ms(delays::COMMAND).await;
        self.delay.delay_ms(delays::COMMAND).await;
        self.send_command(Commands::EntryModeSet as u8).await?;
        self.delay.delay_ms(delays::COMMAND).await;
        self.send_command(Commands::DisplayOn as u8).await
    }

    async fn send(&mut self, data: u8, mode: Mode) -> Result<(), I::Error> {
        let buf = frame(data, mode);
        trace!("{} {=u8:#x} -> {=[u8]:#x}", mode, data, &buf[..]);
        self.i2c.write(self.address, &buf).await
    }

    pub async fn send_command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, Mode::Cmd).await
    }

    pub async fn send_data(&mut self, data: u8) -> Result<(), I::Error> {
        self.send(data, Mode::Data).await
    }

    /// Blank the first row by writing [`CLEAR_WIDTH`] spaces from the home position.
    pub async fn clear(&mut self) -> Result<(), I::Error> {
        self.send_command(RowAddr::First as u8).await?;
        for _ in 0..CLEAR_WIDTH {
            self.send_data(b' ').await?;
        }
        Ok(())
    }

    /// Set the cursor to (rows, col). Coordinates are zero-based.
    pub async fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), I::Error> {
        self.send_command(cursor_command(row, col)).await
    }

    /// Write string to display, stopping at the first NUL byte.
    pub async fn send_string(&mut self, text: &str) -> Result<(), I::Error> {
        for b in string_bytes(text) {
            self.send_data(b).await?;
        }
        Ok(())
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_left(&mut self) -> Result<(), I::Error> {
        self.send_command(Commands::ShiftDisplayLeft as u8).await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_right(&mut self) -> Result<(), I::Error> {
        self.send_command(Commands::ShiftDisplayRight as u8).await
    }

    /// Store a 5x8 glyph in CGRAM slot `location`.
    pub async fn create_char(&mut self, location: u8, pattern: &[u8; 8]) -> Result<(), I::Error> {
        self.send_command(cgram_command(location)).await?;
        for row in pattern {
            self.send_data(*row).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    fn cmd(c: u8) -> I2cTransaction {
        I2cTransaction::write(0x27, frame(c, Mode::Cmd).to_vec())
    }

    fn data(d: u8) -> I2cTransaction {
        I2cTransaction::write(0x27, frame(d, Mode::Data).to_vec())
    }

    #[test]
    fn init_sends_recovery_sequence_in_order() {
        let expected = [
            cmd(0x30),
            cmd(0x30),
            cmd(0x30),
            cmd(0x20),
            cmd(0x28),
            cmd(0x08),
            cmd(0x01),
            cmd(0x06),
            cmd(0x0C),
        ];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay;

        let result = block_on(Lcd::new(&mut i2c, &mut delay).init());
        assert!(result.is_ok());
        drop(result);

        i2c.done();
    }

    #[test]
    fn text_and_cursor() {
        let expected = [cmd(0xC2), data(b'h'), data(b'i'), cmd(0x80), cmd(0x18)];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay;
        let mut lcd = Lcd::new(&mut i2c, &mut delay);

        block_on(async {
            lcd.set_cursor(1, 2).await?;
            lcd.send_string("hi\0there").await?;
            lcd.set_cursor(0, 0).await?;
            lcd.scroll_left().await
        })
        .unwrap();

        i2c.done();
    }

    #[test]
    fn clear_surfaces_error_without_retry() {
        let expected = [cmd(0x80).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay;
        let mut lcd = Lcd::new(&mut i2c, &mut delay);

        assert_eq!(block_on(lcd.clear()), Err(ErrorKind::Other));

        i2c.done();
    }

    #[test]
    fn create_char_and_scroll_right() {
        let glyph = [0x1F; 8];
        let mut expected = std::vec![cmd(0x78)];
        expected.extend(glyph.iter().map(|&row| data(row)));
        expected.push(cmd(0x1C));
        let mut i2c = I2cMock::new(&expected);
        let mut delay = NoopDelay;
        let mut lcd = Lcd::new(&mut i2c, &mut delay);

        assert!(block_on(lcd.create_char(7, &glyph)).is_ok());
        assert!(block_on(lcd.scroll_right()).is_ok());

        i2c.done();
    }
}
