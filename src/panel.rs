//! Controller pair state machine
//!
//! [`Panel`] owns the transport and sequences every command sent to the two
//! controllers. Each public operation checks the current [`PanelState`]
//! first and returns [`Error::InvalidState`] without touching the bus when
//! called out of order.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::color::Color;
use crate::command::{DTM, INIT_SEQUENCE, Register, Target};
use crate::config::{Config, HALF_LINE_BYTES, HEIGHT};
use crate::error::Error;
use crate::interface::PanelInterface;
use crate::source::{LineSource, SolidSource};
use crate::state::{Controller, Operation, PanelState};

pub(crate) type PanelResult<T, I> = core::result::Result<T, Error<<I as PanelInterface>::Error>>;

/// Liveness hook called on every busy-line poll
///
/// A refresh can hold the busy line for 20 s; feed a watchdog here.
/// Implemented for every `FnMut()` closure.
pub trait KeepAlive {
    /// Called once per poll iteration
    fn keep_alive(&mut self);
}

impl<F: FnMut()> KeepAlive for F {
    fn keep_alive(&mut self) {
        self();
    }
}

/// Keepalive that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKeepAlive;

impl KeepAlive for NoKeepAlive {
    fn keep_alive(&mut self) {}
}

/// Bookkeeping for an open half-frame
///
/// The line count is advisory: the controllers accept any number of bytes,
/// and a wrong count only shows up as a garbled refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSession {
    /// Controller receiving the half-frame
    pub controller: Controller,
    /// Lines written since `begin_frame`
    pub lines_written: u16,
    /// Lines whose length was not [`HALF_LINE_BYTES`]
    pub odd_lines: u16,
}

impl FrameSession {
    const fn new(controller: Controller) -> Self {
        Self {
            controller,
            lines_written: 0,
            odd_lines: 0,
        }
    }
}

/// Driver for the dual-controller panel
///
/// ## Example
///
/// ```rust,no_run
/// use epd_13in3e::{Builder, Color, Panel, PanelInterface, Target};
/// # use core::convert::Infallible;
/// # use embedded_hal::delay::DelayNs;
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
/// let config = match Builder::new().build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let mut panel = Panel::new(Bus, config).with_keepalive(|| {
///     // feed the watchdog
/// });
///
/// let _ = panel.power_on(&mut delay);
/// let _ = panel.reset(&mut delay);
/// let _ = panel.init();
/// let _ = panel.clear(Color::White, &mut delay);
/// let _ = panel.power_off(&mut delay);
/// ```
pub struct Panel<I, K = NoKeepAlive>
where
    I: PanelInterface,
{
    /// Hardware interface
    interface: I,
    /// Timing configuration
    config: Config,
    /// Current state
    state: PanelState,
    /// Open half-frame, if any
    frame: Option<FrameSession>,
    /// Busy-wait liveness hook
    keepalive: K,
}

impl<I> Panel<I>
where
    I: PanelInterface,
{
    /// Create a panel driver in the `PoweredOff` state
    ///
    /// Nothing is sent until [`power_on`](Self::power_on).
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            interface,
            config,
            state: PanelState::PoweredOff,
            frame: None,
            keepalive: NoKeepAlive,
        }
    }
}

impl<I, K> Panel<I, K>
where
    I: PanelInterface,
    K: KeepAlive,
{
    /// Install a liveness hook for busy waits
    pub fn with_keepalive<K2: KeepAlive>(self, keepalive: K2) -> Panel<I, K2> {
        Panel {
            interface: self.interface,
            config: self.config,
            state: self.state,
            frame: self.frame,
            keepalive,
        }
    }

    /// Current state
    pub fn state(&self) -> PanelState {
        self.state
    }

    /// The open half-frame, if streaming
    pub fn frame(&self) -> Option<FrameSession> {
        self.frame
    }

    /// Timing configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the hardware interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    #[cfg(test)]
    pub(crate) fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give back the hardware interface
    ///
    /// The panel is left as is; call [`power_off`](Self::power_off) first.
    pub fn release(self) -> I {
        self.interface
    }

    fn ensure(&self, operation: Operation) -> PanelResult<(), I> {
        if self.state.permits(operation) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Send one command to the addressed controller(s)
    ///
    /// Asserts the chip-select(s) of `target`, writes the opcode then
    /// `params`, and deasserts both chip-selects. The chip-selects are
    /// released even when a write fails. Busy is not inspected.
    ///
    /// Only accepted from `Ready`, so a raw command can never land inside
    /// an open half-frame.
    pub fn send_command(&mut self, target: Target, opcode: u8, params: &[u8]) -> PanelResult<(), I> {
        self.ensure(Operation::Command)?;
        self.command(target, opcode, params)
    }

    /// Send a vendor register with its fixed parameter block
    ///
    /// Only accepted from `Ready`.
    pub fn send_register(&mut self, register: Register) -> PanelResult<(), I> {
        self.ensure(Operation::Command)?;
        self.register(register)
    }

    fn command(&mut self, target: Target, opcode: u8, params: &[u8]) -> PanelResult<(), I> {
        debug!("cmd {:#04x} -> {:?} ({} bytes)", opcode, target, params.len());
        let sent = self.write_command(target, opcode, params);
        let released = self.interface.deselect_all();
        sent.map_err(Error::Interface)?;
        released.map_err(Error::Interface)
    }

    fn write_command(&mut self, target: Target, opcode: u8, params: &[u8]) -> Result<(), I::Error> {
        self.interface.select(target)?;
        self.interface.write(&[opcode])?;
        if !params.is_empty() {
            self.interface.write(params)?;
        }
        Ok(())
    }

    fn register(&mut self, register: Register) -> PanelResult<(), I> {
        self.command(register.target(), register.opcode(), register.params())
    }

    /// Park the bus and enable panel power
    ///
    /// `PoweredOff -> Resetting`
    pub fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.ensure(Operation::PowerOn)?;
        self.interface.park().map_err(Error::Interface)?;
        self.interface.set_power(true).map_err(Error::Interface)?;
        delay.delay_ms(self.config.power_on_settle_ms);
        self.state = PanelState::Resetting;
        info!("panel powered on");
        Ok(())
    }

    /// Double hardware reset pulse
    ///
    /// Also the way out of `Sleeping` and out of a failed refresh.
    /// `-> Initializing`
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.ensure(Operation::Reset)?;
        self.interface
            .reset(delay, self.config.reset_pulse_ms)
            .map_err(Error::Interface)?;
        self.state = PanelState::Initializing;
        debug!("reset done");
        Ok(())
    }

    /// Write the vendor register table
    ///
    /// `Initializing -> Ready`. On failure the state stays `Initializing`
    /// so `init` can be retried.
    pub fn init(&mut self) -> PanelResult<(), I> {
        self.ensure(Operation::Init)?;
        for register in INIT_SEQUENCE {
            self.register(register)?;
        }
        self.state = PanelState::Ready;
        debug!("init sequence sent");
        Ok(())
    }

    /// Open a half-frame on `controller`
    ///
    /// The Slave path deasserts every chip-select before asserting its own,
    /// so the two controllers are never selected together.
    /// `Ready -> Streaming(controller)`
    pub fn begin_frame(&mut self, controller: Controller) -> PanelResult<(), I> {
        self.ensure(Operation::BeginFrame)?;
        if controller == Controller::Slave {
            self.interface.deselect_all().map_err(Error::Interface)?;
        }
        let opened = self
            .interface
            .select(controller.target())
            .and_then(|()| self.interface.write(&[DTM]));
        if let Err(e) = opened {
            if let Err(release) = self.interface.deselect_all() {
                warn!("{} chip-select release failed: {:?}", controller, release);
            }
            return Err(Error::Interface(e));
        }
        self.state = PanelState::Streaming(controller);
        self.frame = Some(FrameSession::new(controller));
        debug!("{} frame open", controller);
        Ok(())
    }

    /// Open the Master (left) half-frame
    pub fn begin_frame_master(&mut self) -> PanelResult<(), I> {
        self.begin_frame(Controller::Master)
    }

    /// Open the Slave (right) half-frame
    pub fn begin_frame_slave(&mut self) -> PanelResult<(), I> {
        self.begin_frame(Controller::Slave)
    }

    /// Forward one scanline verbatim
    ///
    /// Bytes are not validated; unknown color nibbles reach the panel as is.
    pub fn write_line(&mut self, line: &[u8]) -> PanelResult<(), I> {
        self.ensure(Operation::WriteLine)?;
        self.interface.write(line).map_err(Error::Interface)?;
        if let Some(frame) = self.frame.as_mut() {
            frame.lines_written = frame.lines_written.saturating_add(1);
            if line.len() != HALF_LINE_BYTES {
                frame.odd_lines = frame.odd_lines.saturating_add(1);
            }
        }
        Ok(())
    }

    /// Close the open half-frame
    ///
    /// `Streaming(_) -> Ready`
    pub fn end_frame(&mut self) -> PanelResult<(), I> {
        self.ensure(Operation::EndFrame)?;
        let released = self.interface.deselect_all();
        if let Some(frame) = self.frame.take() {
            if frame.lines_written != HEIGHT {
                warn!(
                    "{} frame closed after {} of {} lines",
                    frame.controller, frame.lines_written, HEIGHT
                );
            }
            if frame.odd_lines > 0 {
                warn!(
                    "{} frame had {} lines not {} bytes long",
                    frame.controller, frame.odd_lines, HALF_LINE_BYTES
                );
            }
        }
        self.state = PanelState::Ready;
        released.map_err(Error::Interface)
    }

    /// Stream one half-frame from `source`
    ///
    /// Pulls exactly [`HEIGHT`] lines. When the source fails the frame is
    /// still closed and [`Error::StreamTruncated`] is returned.
    pub fn write_half<S: LineSource>(
        &mut self,
        controller: Controller,
        source: &mut S,
    ) -> PanelResult<(), I> {
        self.begin_frame(controller)?;
        let mut line = [0u8; HALF_LINE_BYTES];
        for row in 0..HEIGHT {
            if let Err(e) = source.read_line(&mut line) {
                warn!("{} line source failed at line {}: {:?}", controller, row, e);
                if let Err(close) = self.end_frame() {
                    warn!("{} frame close failed: {:?}", controller, close);
                }
                return Err(Error::StreamTruncated {
                    controller,
                    lines_written: row,
                    expected: HEIGHT,
                });
            }
            if let Err(e) = self.write_line(&line) {
                if let Err(close) = self.end_frame() {
                    warn!("{} frame close failed: {:?}", controller, close);
                }
                return Err(e);
            }
        }
        self.end_frame()
    }

    /// Stream a full image: Master half, then Slave half
    pub fn write_frame<S: LineSource>(&mut self, source: &mut S) -> PanelResult<(), I> {
        self.write_half(Controller::Master, source)?;
        self.write_half(Controller::Slave, source)
    }

    /// Stream a full image and refresh
    pub fn display_frame<S: LineSource, D: DelayNs>(
        &mut self,
        source: &mut S,
        delay: &mut D,
    ) -> PanelResult<(), I> {
        self.write_frame(source)?;
        self.refresh(delay)
    }

    /// Fill the whole panel with one color and refresh
    pub fn clear<D: DelayNs>(&mut self, color: Color, delay: &mut D) -> PanelResult<(), I> {
        self.ensure(Operation::Clear)?;
        info!("clearing to {:?}", color);
        self.write_frame(&mut SolidSource::new(color))?;
        self.refresh(delay)
    }

    /// Drive the panel through a full refresh
    ///
    /// Power on, refresh, power off the charge pumps. This panel family must
    /// not be polled for busy after the final power-off command.
    /// On error the state is left at `Refreshing`; recover with
    /// [`reset`](Self::reset) or [`power_off`](Self::power_off).
    /// `Ready -> Refreshing -> Ready`
    pub fn refresh<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.ensure(Operation::Refresh)?;
        self.state = PanelState::Refreshing;
        info!("refresh started");

        self.register(Register::PowerOn)?;
        self.wait_ready(delay)?;
        delay.delay_ms(self.config.refresh_settle_ms);

        self.register(Register::DisplayRefresh)?;
        self.wait_ready(delay)?;

        self.register(Register::PowerOff)?;

        self.state = PanelState::Ready;
        info!("refresh done");
        Ok(())
    }

    /// Put both controllers into deep sleep
    ///
    /// `Ready -> Sleeping`. Only a reset wakes the panel.
    pub fn sleep<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.ensure(Operation::Sleep)?;
        self.enter_sleep(delay)
    }

    fn enter_sleep<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        self.register(Register::DeepSleep)?;
        delay.delay_ms(self.config.sleep_settle_ms);
        self.state = PanelState::Sleeping;
        debug!("deep sleep");
        Ok(())
    }

    /// Sleep if needed, then cut panel power
    ///
    /// Accepted from every state. An open frame is closed first. Power is
    /// cut even when the sleep command fails, and that error is returned.
    /// `-> PoweredOff`
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        if self.state == PanelState::PoweredOff {
            return Ok(());
        }
        if self.frame.take().is_some() {
            warn!("power off with an open frame");
            if let Err(e) = self.interface.deselect_all() {
                warn!("chip-select release failed: {:?}", e);
            }
            self.state = PanelState::Ready;
        }

        let slept = if self.state == PanelState::Sleeping {
            Ok(())
        } else {
            self.enter_sleep(delay)
        };
        if let Err(e) = &slept {
            warn!("sleep before power off failed: {:?}", e);
        }

        delay.delay_ms(self.config.power_off_settle_ms);
        self.interface.set_power(false).map_err(Error::Interface)?;
        self.state = PanelState::PoweredOff;
        info!("panel powered off");
        slept
    }

    /// Block until the busy line reports ready
    ///
    /// Polls every `busy_poll_interval_ms`, calling the keepalive hook on
    /// each iteration, then waits `busy_release_settle_ms`. The timeout is
    /// only checked between polls.
    pub fn wait_ready<D: DelayNs>(&mut self, delay: &mut D) -> PanelResult<(), I> {
        let poll_ms = self.config.busy_poll_interval_ms;
        let timeout_ms = self.config.busy_timeout_ms;
        let mut waited_ms: u32 = 0;

        debug!("busy");
        while !self.interface.is_ready().map_err(Error::Interface)? {
            if timeout_ms != 0 && waited_ms >= timeout_ms {
                warn!("busy timeout after {} ms", waited_ms);
                return Err(Error::BusyTimeout { waited_ms });
            }
            delay.delay_ms(poll_ms);
            waited_ms = waited_ms.saturating_add(poll_ms);
            self.keepalive.keep_alive();
        }
        delay.delay_ms(self.config.busy_release_settle_ms);
        debug!("busy released after {} ms", waited_ms);
        Ok(())
    }
}
