//! 13.3" 6-Color E-Paper Panel Driver
//!
//! A driver for the 1200x1600 dual-controller 6-color e-paper panel. The left
//! 600 columns belong to the Master controller, the right 600 to the Slave;
//! each has its own chip-select on one shared SPI bus.
//!
//! ## Features
//!
//! - `no_std` compatible, no allocation
//! - `embedded-hal` v1.0 support
//! - Line-by-line streaming: a full image never has to fit in RAM
//! - Guarded power sequence: out-of-order calls are rejected, not sent
//! - Power cycles for battery operation
//! - Change-token session for fetch-and-render loops
//! - `embedded-graphics` color interop (with `graphics` feature)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use epd_13in3e::{Builder, Color, Interface, Panel};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiBus for MockSpi {
//! #     fn read(&mut self, _words: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn write(&mut self, _words: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn transfer(&mut self, _r: &mut [u8], _w: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn flush(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let (cs_m, cs_s, dc, rst, busy, pwr) = (MockPin, MockPin, MockPin, MockPin, MockPin, MockPin);
//! # let mut delay = MockDelay;
//! let interface = Interface::new(spi, cs_m, cs_s, dc, rst, busy).with_power_pin(pwr);
//! let config = match Builder::new().busy_timeout_ms(40_000).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut panel = Panel::new(interface, config);
//! let _ = panel.clear_cycle(Color::White, &mut delay);
//! ```

#![no_std]

#[cfg(test)]
extern crate alloc;

/// Color codes and pixel packing
pub mod color;
/// Panel opcodes and the vendor register table
pub mod command;
/// Panel geometry and timing configuration
pub mod config;
/// Error types for the driver
pub mod error;
/// Hardware interface abstraction
pub mod interface;
/// Controller pair state machine
pub mod panel;
mod power;
/// Change-driven refresh session
pub mod session;
/// Scanline sources
pub mod source;
/// Panel state machine types
pub mod state;

#[cfg(test)]
mod mock;

pub use color::{Color, InvalidColorCode};
pub use command::{Register, Target};
pub use config::{
    Builder, Config, DEFAULT_BUSY_TIMEOUT_MS, HALF_FRAME_BYTES, HALF_LINE_BYTES, HALF_WIDTH,
    HEIGHT, IMAGE_BYTES, WIDTH,
};
pub use error::{BuilderError, Error};
pub use interface::{Interface, InterfaceError, NoPin, PanelInterface};
pub use panel::{FrameSession, KeepAlive, NoKeepAlive, Panel};
pub use session::{
    ChangeToken, ImageSource, MetadataSource, NoStore, PollOutcome, Session, SyncError,
    TOKEN_CAPACITY, TokenStore,
};
pub use source::{FnSource, LineSource, ReaderSource, SolidSource};
pub use state::{Controller, Operation, PanelState};
