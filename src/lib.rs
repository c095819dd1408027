#![no_std]
//! Driver for HD44780 character LCDs wired through a PCF8574 I2C expander, the ubiquitous
//! "I2C backpack" found on 16x2 modules. It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! Every byte reaches the controller in 4-bit mode as one 4-byte [`frame`]: upper nibble with
//! enable high, upper nibble with enable low, then the same for the lower nibble. The controller
//! latches on the falling edge of enable.
//!
//! Usage on a STM32F4:
//! ```ignore
//! let dp = pac::Peripherals::take().unwrap();
//! let cp = pac::CorePeripherals::take().unwrap();
//! let rcc = dp.RCC.constrain();
//! let clocks = rcc.cfgr.freeze();
//! let gpiob = dp.GPIOB.split();
//!
//! let mut i2c = I2c::new(
//!     dp.I2C2,
//!     (gpiob.pb10, gpiob.pb11),
//!     i2c::Mode::standard(100.kHz()),
//!     &clocks,
//! );
//! let mut delay = cp.SYST.delay(&clocks);
//!
//! let mut lcd = lcd_pcf8574_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_address(lcd_pcf8574_i2c::DEFAULT_ADDRESS)
//!     .init()
//!     .unwrap();
//! lcd.set_cursor(1, 3).unwrap();
//! lcd.send_string("hello").unwrap();
//! ```
//!
//! The driver keeps no display state; cursor position and display shift live in the controller.
//! Access to the bus must be serialized by the caller.
//!
//! With the `async` feature the same API is available for [`embedded_hal_async`] in
//! `async_lcd`. With the `defmt` feature every transmitted frame is traced through `defmt`.

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::trace!($($arg)*);
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
    };
}

pub mod sync_lcd;

#[cfg(feature = "async")]
pub mod async_lcd;

/// 7-bit address of the expander. The 8-bit write address on the wire is `0x4E`.
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Bytes per transmission: two nibbles, each with enable asserted then deasserted.
pub const FRAME_LEN: usize = 4;

/// Number of cells [`sync_lcd::Lcd::clear`] overwrites. Fixed to the first row of a 16x2 module.
pub const CLEAR_WIDTH: usize = 16;

const UPPER_BITS_MASK: u8 = 0xF0;

/// Register select of a transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Instruction register, RS=0.
    Cmd,
    /// Data register, RS=1.
    Data,
}

// P0 = RS, P2 = EN, P3 = backlight; backlight stays on.
#[repr(u8)]
#[derive(Copy, Clone)]
enum Control {
    CmdEnable = 0x0C,
    CmdLatch = 0x08,
    DataEnable = 0x0D,
    DataLatch = 0x09,
}

impl Mode {
    fn control(self) -> (Control, Control) {
        match self {
            Mode::Cmd => (Control::CmdEnable, Control::CmdLatch),
            Mode::Data => (Control::DataEnable, Control::DataLatch),
        }
    }
}

/// Controller instructions used by the driver.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Commands {
    ClearDisplay = 0x01,
    /// Increment cursor, no display shift.
    EntryModeSet = 0x06,
    DisplayOff = 0x08,
    /// Display on, cursor and blink off.
    DisplayOn = 0x0C,
    ShiftDisplayLeft = 0x18,
    ShiftDisplayRight = 0x1C,
    /// Sent first during init to commit the controller to 4-bit transfers.
    Init4Bit = 0x20,
    /// 4-bit interface, two lines, 5x8 font.
    FunctionSet = 0x28,
    /// Sent three times during init to recover from an unknown state.
    Init8Bit = 0x30,
    SetCgramAddr = 0x40,
}

/// DDRAM address of the first cell of each row.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RowAddr {
    First = 0x80,
    Second = 0xC0,
}

/// Settle times of the power-on sequence in milliseconds, in the order they are waited.
mod delays {
    pub const POWER_ON: u32 = 50;
    pub const INIT_8BIT: [u32; 3] = [5, 1, 10];
    pub const INIT_4BIT: u32 = 10;
    pub const COMMAND: u32 = 1;
}

/// Builds the 4-byte frame carrying `value` to the controller.
///
/// The upper nibble keeps its position, the lower nibble is shifted into the upper four bits.
/// Each nibble is sent with enable high, then with enable low.
pub fn frame(value: u8, mode: Mode) -> [u8; FRAME_LEN] {
    let high_bits = value & UPPER_BITS_MASK;
    let low_bits = (value << 4) & UPPER_BITS_MASK;
    let (enable, latch) = mode.control();
    [
        high_bits | enable as u8,
        high_bits | latch as u8,
        low_bits | enable as u8,
        low_bits | latch as u8,
    ]
}

/// Command that moves the cursor to (`row`, `col`).
///
/// Rows other than 0 and 1 leave `col` untouched, which the controller interprets as whatever
/// instruction those bits encode. No validation is done.
fn cursor_command(row: u8, col: u8) -> u8 {
    match row {
        0 => col | RowAddr::First as u8,
        1 => col | RowAddr::Second as u8,
        _ => {
            warn!("row {=u8} out of range, sending column as raw command", row);
            col
        }
    }
}

fn cgram_command(location: u8) -> u8 {
    Commands::SetCgramAddr as u8 | ((location & 0x07) << 3)
}

/// Bytes of `text` up to, not including, the first NUL.
fn string_bytes(text: &str) -> impl Iterator<Item = u8> + '_ {
    text.bytes().take_while(|&b| b != 0)
}
