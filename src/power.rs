//! Power cycles
//!
//! Battery-powered frames keep the panel unpowered between updates. These
//! helpers run a whole update from `PoweredOff` back to `PoweredOff`:
//!
//! ```text
//! power_on -> reset -> init -> stream/clear -> refresh -> sleep -> power_off
//! ```
//!
//! Power is always cut at the end, even when a step in the middle fails.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::color::Color;
use crate::interface::PanelInterface;
use crate::panel::{KeepAlive, Panel, PanelResult};
use crate::source::LineSource;

impl<I, K> Panel<I, K>
where
    I: PanelInterface,
    K: KeepAlive,
{
    /// Reset and re-initialise the controllers
    ///
    /// Used after [`power_on`](Self::power_on) and to leave deep sleep.
    pub fn wake<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.reset(delay)?;
        self.init()
    }

    /// Show one image, powering the panel only for the update
    ///
    /// When the source fails the refresh is skipped. The first error is
    /// returned after power has been cut.
    ///
    /// ```rust,no_run
    /// # use core::convert::Infallible;
    /// # use embedded_hal::delay::DelayNs;
    /// # use epd_13in3e::{PanelInterface, Target};
    /// # struct Bus;
    /// # impl PanelInterface for Bus {
    /// #     type Error = Infallible;
    /// #     fn park(&mut self) -> Result<(), Infallible> { Ok(()) }
    /// #     fn select(&mut self, _t: Target) -> Result<(), Infallible> { Ok(()) }
    /// #     fn deselect_all(&mut self) -> Result<(), Infallible> { Ok(()) }
    /// #     fn write(&mut self, _d: &[u8]) -> Result<(), Infallible> { Ok(()) }
    /// #     fn reset<D: DelayNs>(&mut self, _d: &mut D, _ms: u32) -> Result<(), Infallible> { Ok(()) }
    /// #     fn is_ready(&mut self) -> Result<bool, Infallible> { Ok(true) }
    /// #     fn set_power(&mut self, _on: bool) -> Result<(), Infallible> { Ok(()) }
    /// # }
    /// # struct Delay;
    /// # impl DelayNs for Delay { fn delay_ns(&mut self, _ns: u32) {} }
    /// # let mut delay = Delay;
    /// use epd_13in3e::{Config, Panel, ReaderSource};
    ///
    /// # let body: &[u8] = &[];
    /// let mut panel = Panel::new(Bus, Config::default());
    /// let mut image = ReaderSource::new(body);
    /// if let Err(e) = panel.present(&mut image, &mut delay) {
    ///     // panel is powered off either way
    ///     let _ = e;
    /// }
    /// ```
    pub fn present<S: LineSource, D: DelayNs>(
        &mut self,
        source: &mut S,
        delay: &mut D,
    ) -> PanelResult<(), I> {
        self.power_on(delay)?;
        let drawn = self
            .wake(delay)
            .and_then(|()| self.display_frame(source, delay));
        self.finish_cycle(drawn, delay)
    }

    /// Fill the panel with one color, powering it only for the update
    pub fn clear_cycle<D: DelayNs>(&mut self, color: Color, delay: &mut D) -> PanelResult<(), I> {
        self.power_on(delay)?;
        let drawn = self.wake(delay).and_then(|()| self.clear(color, delay));
        self.finish_cycle(drawn, delay)
    }

    fn finish_cycle<D: DelayNs>(
        &mut self,
        drawn: PanelResult<(), I>,
        delay: &mut D,
    ) -> PanelResult<(), I> {
        match &drawn {
            Ok(()) => info!("update cycle done"),
            Err(e) => warn!("update cycle failed: {:?}", e),
        }
        let off = self.power_off(delay);
        drawn?;
        off
    }
}

#[cfg(test)]
mod tests {
    use crate::command::{DRF, DSLP, DTM, INIT_SEQUENCE, POF, PON};
    use crate::config::{Builder, Config, HALF_LINE_BYTES, HEIGHT};
    use crate::error::Error;
    use crate::mock::{Event, MockDelay, MockInterface};
    use crate::source::ReaderSource;
    use crate::state::{Controller, PanelState};
    use crate::{Color, Panel, SolidSource};
    use alloc::vec::Vec;

    fn config() -> Config {
        Builder::new().busy_timeout_ms(100).build().unwrap()
    }

    fn opcodes(panel: &Panel<MockInterface>) -> Vec<u8> {
        panel
            .interface()
            .opcodes()
            .into_iter()
            .map(|(_, opcode)| opcode)
            .collect()
    }

    fn expected_cycle() -> Vec<u8> {
        let mut expected: Vec<u8> = INIT_SEQUENCE.iter().map(|r| r.opcode()).collect();
        expected.extend([DTM, DTM, PON, DRF, POF, DSLP]);
        expected
    }

    #[test]
    fn test_present_runs_full_cycle() {
        let mut panel = Panel::new(MockInterface::new(), config());
        let mut delay = MockDelay::new();

        panel
            .present(&mut SolidSource::new(Color::Green), &mut delay)
            .unwrap();

        let events = &panel.interface().events;
        assert_eq!(events.first(), Some(&Event::Park));
        assert_eq!(events[1], Event::Power(true));
        assert_eq!(events[2], Event::Reset { pulse_ms: 30 });
        assert_eq!(events.last(), Some(&Event::Power(false)));
        assert_eq!(opcodes(&panel), expected_cycle());
        assert_eq!(panel.state(), PanelState::PoweredOff);
    }

    #[test]
    fn test_present_skips_refresh_on_truncation() {
        let mut panel = Panel::new(MockInterface::new(), config());
        let mut delay = MockDelay::new();
        // Master half complete, Slave half cut short
        let image = alloc::vec![0x11u8; HALF_LINE_BYTES * (HEIGHT as usize + 10)];

        let result = panel.present(&mut ReaderSource::new(&image[..]), &mut delay);

        assert!(matches!(
            result,
            Err(Error::StreamTruncated {
                controller: Controller::Slave,
                lines_written: 10,
                ..
            })
        ));
        let sent = opcodes(&panel);
        assert!(!sent.contains(&PON));
        assert!(!sent.contains(&DRF));
        assert_eq!(sent.last(), Some(&DSLP));
        assert!(!panel.interface().powered);
        assert_eq!(panel.state(), PanelState::PoweredOff);
    }

    #[test]
    fn test_cycle_powers_off_after_busy_timeout() {
        let mut interface = MockInterface::new();
        interface.stuck_busy = true;
        let mut panel = Panel::new(interface, config());
        let mut delay = MockDelay::new();

        let result = panel.clear_cycle(Color::White, &mut delay);

        assert!(matches!(result, Err(Error::BusyTimeout { .. })));
        assert_eq!(panel.interface().events.last(), Some(&Event::Power(false)));
        assert_eq!(panel.state(), PanelState::PoweredOff);
    }

    #[test]
    fn test_repeated_clear_cycles_are_identical() {
        let mut panel = Panel::new(MockInterface::new(), config());
        let mut runs = Vec::new();

        for _ in 0..4 {
            let mut delay = MockDelay::new();
            panel.clear_cycle(Color::White, &mut delay).unwrap();

            assert_eq!(opcodes(&panel), expected_cycle());
            assert_eq!(panel.state(), PanelState::PoweredOff);
            assert!(!panel.interface().any_selected());
            runs.push((panel.interface().events.clone(), delay.delays_ms));
            panel.interface_mut().clear_events();
        }

        assert!(runs.iter().all(|run| *run == runs[0]));
    }

    #[test]
    fn test_wake_from_sleep() {
        let mut panel = Panel::new(MockInterface::new(), config());
        let mut delay = MockDelay::new();
        panel.power_on(&mut delay).unwrap();
        panel.wake(&mut delay).unwrap();
        panel.sleep(&mut delay).unwrap();

        panel.wake(&mut delay).unwrap();

        assert_eq!(panel.state(), PanelState::Ready);
    }
}
