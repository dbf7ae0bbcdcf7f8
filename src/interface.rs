//! Hardware interface abstraction
//!
//! This module provides the [`PanelInterface`] trait and the [`Interface`] struct
//! for talking to the two panel controllers over one SPI bus.
//!
//! ## Hardware Requirements
//!
//! The panel requires:
//! - SPI bus (MOSI + SCK), shared by both controllers
//! - 5 GPIO pins, plus one optional:
//!   - **CS_M**: Master chip select (output, active low)
//!   - **CS_S**: Slave chip select (output, active low)
//!   - **DC**: Data/Command (output, parked high)
//!   - **RST**: Reset (output, active low)
//!   - **BUSY**: Busy status (input, low while busy)
//!   - **PWR**: Power enable (output, active high, optional)
//!
//! Chip-selects are driven by hand, so the bus is an [`SpiBus`] rather than
//! an `SpiDevice`.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::command::Target;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Trait for hardware interface to the controller pair
///
/// This trait abstracts over different hardware implementations,
/// allowing the [`Panel`](crate::Panel) to work with any
/// SPI + GPIO implementation.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. Implement this
/// trait yourself for unusual wiring (e.g. CS lines behind an expander).
pub trait PanelInterface {
    /// Error type for interface operations
    type Error: Debug;

    /// Put every control line in its idle level
    ///
    /// Both CS high, DC high, RST high.
    fn park(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Assert the chip-select line(s) of `target`
    ///
    /// Lines not named by `target` are left untouched.
    fn select(&mut self, target: Target) -> InterfaceResult<(), Self::Error>;

    /// Deassert both chip-select lines
    ///
    /// Any buffered SPI bytes must be flushed first.
    fn deselect_all(&mut self) -> InterfaceResult<(), Self::Error>;

    /// Clock bytes out to whichever controller(s) are selected
    fn write(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Perform the double hardware reset pulse
    ///
    /// The implementation must drive RST high, low, high, low, high,
    /// holding each level for `pulse_ms`. A single pulse leaves one
    /// controller out of step with the other.
    fn reset<D: DelayNs>(&mut self, delay: &mut D, pulse_ms: u32)
    -> InterfaceResult<(), Self::Error>;

    /// Sample the busy line
    ///
    /// Returns `true` when the panel is ready (BUSY high).
    fn is_ready(&mut self) -> InterfaceResult<bool, Self::Error>;

    /// Drive the power-enable line, if there is one
    fn set_power(&mut self, on: bool) -> InterfaceResult<(), Self::Error>;
}

/// Errors that can occur at the interface level
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InterfaceError {
    /// SPI communication error
    #[error("SPI error: {0}")]
    Spi(spi::ErrorKind),
    /// GPIO pin error
    #[error("pin error: {0}")]
    Pin(digital::ErrorKind),
}

impl InterfaceError {
    fn spi<E: spi::Error>(e: E) -> Self {
        Self::Spi(e.kind())
    }

    fn pin<E: digital::Error>(e: E) -> Self {
        Self::Pin(e.kind())
    }
}

/// Placeholder for an unconnected power-enable line
///
/// Used when the panel's supply is hard-wired on.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPin;

impl digital::ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Hardware interface implementation for the dual-controller panel
///
/// Implements [`PanelInterface`] for embedded-hal v1.0 SPI and GPIO traits.
///
/// ## Type Parameters
///
/// * `SPI` - SPI bus implementing [`SpiBus`]
/// * `CSM` / `CSS` - Master and Slave chip selects implementing [`OutputPin`]
/// * `DC` - Data/Command pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `BUSY` - Busy pin implementing [`InputPin`]
/// * `PWR` - Power-enable pin implementing [`OutputPin`], [`NoPin`] if absent
pub struct Interface<SPI, CSM, CSS, DC, RST, BUSY, PWR = NoPin> {
    /// SPI bus shared by both controllers
    spi: SPI,
    /// Master chip select (active low)
    cs_master: CSM,
    /// Slave chip select (active low)
    cs_slave: CSS,
    /// Data/Command line, held at data level
    dc: DC,
    /// Reset pin (active low)
    rst: RST,
    /// Busy pin (low while busy)
    busy: BUSY,
    /// Power enable (active high)
    power: PWR,
}

impl<SPI, CSM, CSS, DC, RST, BUSY> Interface<SPI, CSM, CSS, DC, RST, BUSY>
where
    SPI: SpiBus,
    CSM: OutputPin,
    CSS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    /// Create a new Interface without a power-enable line
    ///
    /// ## Example
    ///
    /// ```rust,no_run
    /// use epd_13in3e::Interface;
    /// # use core::convert::Infallible;
    /// # use embedded_hal::digital::{InputPin, OutputPin};
    /// # use embedded_hal::spi::SpiBus;
    /// # struct MockSpi;
    /// # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
    /// # impl SpiBus for MockSpi {
    /// #     fn read(&mut self, _words: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
    /// #     fn write(&mut self, _words: &[u8]) -> Result<(), Infallible> { Ok(()) }
    /// #     fn transfer(&mut self, _r: &mut [u8], _w: &[u8]) -> Result<(), Infallible> { Ok(()) }
    /// #     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
    /// #     fn flush(&mut self) -> Result<(), Infallible> { Ok(()) }
    /// # }
    /// # struct MockPin;
    /// # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
    /// # impl OutputPin for MockPin {
    /// #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
    /// #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
    /// # }
    /// # impl InputPin for MockPin {
    /// #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
    /// #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
    /// # }
    /// let _interface = Interface::new(MockSpi, MockPin, MockPin, MockPin, MockPin, MockPin)
    ///     .with_power_pin(MockPin);
    /// ```
    pub fn new(spi: SPI, cs_master: CSM, cs_slave: CSS, dc: DC, rst: RST, busy: BUSY) -> Self {
        Self {
            spi,
            cs_master,
            cs_slave,
            dc,
            rst,
            busy,
            power: NoPin,
        }
    }

    /// Attach a power-enable line
    pub fn with_power_pin<PWR: OutputPin>(
        self,
        power: PWR,
    ) -> Interface<SPI, CSM, CSS, DC, RST, BUSY, PWR> {
        Interface {
            spi: self.spi,
            cs_master: self.cs_master,
            cs_slave: self.cs_slave,
            dc: self.dc,
            rst: self.rst,
            busy: self.busy,
            power,
        }
    }
}

impl<SPI, CSM, CSS, DC, RST, BUSY, PWR> Interface<SPI, CSM, CSS, DC, RST, BUSY, PWR> {
    /// Give back the bus and pins
    pub fn release(self) -> (SPI, CSM, CSS, DC, RST, BUSY, PWR) {
        (
            self.spi,
            self.cs_master,
            self.cs_slave,
            self.dc,
            self.rst,
            self.busy,
            self.power,
        )
    }
}

impl<SPI, CSM, CSS, DC, RST, BUSY, PWR> PanelInterface
    for Interface<SPI, CSM, CSS, DC, RST, BUSY, PWR>
where
    SPI: SpiBus,
    CSM: OutputPin,
    CSS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    PWR: OutputPin,
{
    type Error = InterfaceError;

    fn park(&mut self) -> InterfaceResult<(), Self::Error> {
        self.cs_master.set_high().map_err(InterfaceError::pin)?;
        self.cs_slave.set_high().map_err(InterfaceError::pin)?;
        self.dc.set_high().map_err(InterfaceError::pin)?;
        self.rst.set_high().map_err(InterfaceError::pin)?;
        Ok(())
    }

    fn select(&mut self, target: Target) -> InterfaceResult<(), Self::Error> {
        if matches!(target, Target::Master | Target::Both) {
            self.cs_master.set_low().map_err(InterfaceError::pin)?;
        }
        if matches!(target, Target::Slave | Target::Both) {
            self.cs_slave.set_low().map_err(InterfaceError::pin)?;
        }
        Ok(())
    }

    fn deselect_all(&mut self) -> InterfaceResult<(), Self::Error> {
        // Release both lines even when the flush fails
        let flushed = self.spi.flush().map_err(InterfaceError::spi);
        self.cs_master.set_high().map_err(InterfaceError::pin)?;
        self.cs_slave.set_high().map_err(InterfaceError::pin)?;
        flushed
    }

    fn write(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.spi.write(data).map_err(InterfaceError::spi)
    }

    fn reset<D: DelayNs>(
        &mut self,
        delay: &mut D,
        pulse_ms: u32,
    ) -> InterfaceResult<(), Self::Error> {
        // HIGH -> LOW -> HIGH -> LOW -> HIGH, both controllers latch the second pulse
        self.rst.set_high().map_err(InterfaceError::pin)?;
        delay.delay_ms(pulse_ms);
        for _ in 0..2 {
            self.rst.set_low().map_err(InterfaceError::pin)?;
            delay.delay_ms(pulse_ms);
            self.rst.set_high().map_err(InterfaceError::pin)?;
            delay.delay_ms(pulse_ms);
        }
        Ok(())
    }

    fn is_ready(&mut self) -> InterfaceResult<bool, Self::Error> {
        self.busy.is_high().map_err(InterfaceError::pin)
    }

    fn set_power(&mut self, on: bool) -> InterfaceResult<(), Self::Error> {
        if on {
            self.power.set_high().map_err(InterfaceError::pin)
        } else {
            self.power.set_low().map_err(InterfaceError::pin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    type TestInterface = Interface<SpiMock<u8>, PinMock, PinMock, PinMock, PinMock, PinMock>;

    struct Harness {
        spi: SpiMock<u8>,
        cs_master: PinMock,
        cs_slave: PinMock,
        dc: PinMock,
        rst: PinMock,
        busy: PinMock,
    }

    impl Harness {
        fn interface(&self) -> TestInterface {
            Interface::new(
                self.spi.clone(),
                self.cs_master.clone(),
                self.cs_slave.clone(),
                self.dc.clone(),
                self.rst.clone(),
                self.busy.clone(),
            )
        }

        fn done(&mut self) {
            self.spi.done();
            self.cs_master.done();
            self.cs_slave.done();
            self.dc.done();
            self.rst.done();
            self.busy.done();
        }
    }

    fn idle_pin() -> PinMock {
        PinMock::new(&[])
    }

    fn set(state: PinState) -> PinTransaction {
        PinTransaction::set(state)
    }

    #[test]
    fn test_double_reset_pulse() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: idle_pin(),
            cs_slave: idle_pin(),
            dc: idle_pin(),
            rst: PinMock::new(&[
                set(PinState::High),
                set(PinState::Low),
                set(PinState::High),
                set(PinState::Low),
                set(PinState::High),
            ]),
            busy: idle_pin(),
        };
        let mut delay = MockDelay::new();
        let mut interface = harness.interface();

        interface.reset(&mut delay, 30).unwrap();

        assert_eq!(delay.delays_ms, [30, 30, 30, 30, 30]);
        harness.done();
    }

    #[test]
    fn test_select_master_leaves_slave_alone() {
        let mut harness = Harness {
            spi: SpiMock::new(&[
                SpiTransaction::write_vec(alloc::vec![0x74, 0xC0]),
                SpiTransaction::flush(),
            ]),
            cs_master: PinMock::new(&[set(PinState::Low), set(PinState::High)]),
            cs_slave: PinMock::new(&[set(PinState::High)]),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: idle_pin(),
        };
        let mut interface = harness.interface();

        interface.select(Target::Master).unwrap();
        interface.write(&[0x74, 0xC0]).unwrap();
        interface.deselect_all().unwrap();

        harness.done();
    }

    #[test]
    fn test_select_both() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: PinMock::new(&[set(PinState::Low)]),
            cs_slave: PinMock::new(&[set(PinState::Low)]),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: idle_pin(),
        };
        let mut interface = harness.interface();

        interface.select(Target::Both).unwrap();

        harness.done();
    }

    #[test]
    fn test_park_sets_idle_levels() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: PinMock::new(&[set(PinState::High)]),
            cs_slave: PinMock::new(&[set(PinState::High)]),
            dc: PinMock::new(&[set(PinState::High)]),
            rst: PinMock::new(&[set(PinState::High)]),
            busy: idle_pin(),
        };
        let mut interface = harness.interface();

        interface.park().unwrap();

        harness.done();
    }

    #[test]
    fn test_busy_high_means_ready() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: idle_pin(),
            cs_slave: idle_pin(),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: PinMock::new(&[
                PinTransaction::get(PinState::Low),
                PinTransaction::get(PinState::High),
            ]),
        };
        let mut interface = harness.interface();

        assert!(!interface.is_ready().unwrap());
        assert!(interface.is_ready().unwrap());

        harness.done();
    }

    #[test]
    fn test_power_pin() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: idle_pin(),
            cs_slave: idle_pin(),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: idle_pin(),
        };
        let mut power = PinMock::new(&[set(PinState::High), set(PinState::Low)]);
        let mut interface = harness.interface().with_power_pin(power.clone());

        interface.set_power(true).unwrap();
        interface.set_power(false).unwrap();

        power.done();
        harness.done();
    }

    #[test]
    fn test_no_power_pin_is_noop() {
        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: idle_pin(),
            cs_slave: idle_pin(),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: idle_pin(),
        };
        let mut interface = harness.interface();

        assert!(interface.set_power(true).is_ok());
        assert!(interface.set_power(false).is_ok());

        harness.done();
    }

    #[test]
    fn test_busy_read_error_is_mapped() {
        extern crate std;
        use embedded_hal_mock::eh1::MockError;

        let mut harness = Harness {
            spi: SpiMock::new(&[]),
            cs_master: idle_pin(),
            cs_slave: idle_pin(),
            dc: idle_pin(),
            rst: idle_pin(),
            busy: PinMock::new(&[PinTransaction::get(PinState::High)
                .with_error(MockError::Io(std::io::ErrorKind::NotConnected))]),
        };
        let mut interface = harness.interface();

        assert!(matches!(interface.is_ready(), Err(InterfaceError::Pin(_))));

        harness.done();
    }
}
