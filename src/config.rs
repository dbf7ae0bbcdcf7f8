//! Panel geometry and timing configuration

pub use crate::error::BuilderError;

/// Panel width in pixels (both controllers together)
pub const WIDTH: u16 = 1200;

/// Panel height in pixels (gate lines)
pub const HEIGHT: u16 = 1600;

/// Columns owned by each controller
pub const HALF_WIDTH: u16 = WIDTH / 2;

/// Bytes in one scanline of one controller (2 pixels per byte)
pub const HALF_LINE_BYTES: usize = WIDTH as usize / 4;

/// Bytes in one controller's full-height half-frame
pub const HALF_FRAME_BYTES: usize = HALF_LINE_BYTES * HEIGHT as usize;

/// Bytes in a complete image on the wire (Master half, then Slave half)
pub const IMAGE_BYTES: usize = HALF_FRAME_BYTES * 2;

/// Default timeout for busy-wait in milliseconds
///
/// A full refresh has been observed to take up to ~20 s.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 30_000;

/// Panel timing configuration
///
/// All values are in milliseconds. Use [`Builder`] to create a Config.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Hold time of each level in the double reset pulse
    pub reset_pulse_ms: u32,
    /// Settle time after asserting the power-enable line
    pub power_on_settle_ms: u32,
    /// Settle time after the deep-sleep command
    pub sleep_settle_ms: u32,
    /// Wait between deep sleep and releasing the power-enable line
    pub power_off_settle_ms: u32,
    /// Pause between power-on completing and the refresh command
    pub refresh_settle_ms: u32,
    /// Interval between busy line polls
    pub busy_poll_interval_ms: u32,
    /// Settle time after the busy line reports ready
    pub busy_release_settle_ms: u32,
    /// Maximum time to wait for the busy line (0 = wait forever)
    pub busy_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_pulse_ms: 30,
            power_on_settle_ms: 100,
            sleep_settle_ms: 100,
            power_off_settle_ms: 100,
            refresh_settle_ms: 50,
            busy_poll_interval_ms: 10,
            busy_release_settle_ms: 20,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Builder for constructing panel configuration
///
/// # Example
///
/// ```
/// use epd_13in3e::Builder;
///
/// let config = match Builder::new().busy_timeout_ms(45_000).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.busy_timeout_ms, 45_000);
/// assert_eq!(config.reset_pulse_ms, 30);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new Builder with default timings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hold time of each reset pulse level
    pub fn reset_pulse_ms(mut self, value: u32) -> Self {
        self.config.reset_pulse_ms = value;
        self
    }

    /// Set the settle time after power-enable
    pub fn power_on_settle_ms(mut self, value: u32) -> Self {
        self.config.power_on_settle_ms = value;
        self
    }

    /// Set the settle time after deep sleep
    pub fn sleep_settle_ms(mut self, value: u32) -> Self {
        self.config.sleep_settle_ms = value;
        self
    }

    /// Set the wait before releasing power-enable
    pub fn power_off_settle_ms(mut self, value: u32) -> Self {
        self.config.power_off_settle_ms = value;
        self
    }

    /// Set the pause between power-on and the refresh command
    pub fn refresh_settle_ms(mut self, value: u32) -> Self {
        self.config.refresh_settle_ms = value;
        self
    }

    /// Set the busy line poll interval
    pub fn busy_poll_interval_ms(mut self, value: u32) -> Self {
        self.config.busy_poll_interval_ms = value;
        self
    }

    /// Set the settle time after the busy line releases
    pub fn busy_release_settle_ms(mut self, value: u32) -> Self {
        self.config.busy_release_settle_ms = value;
        self
    }

    /// Set the busy-wait timeout
    ///
    /// Default is 30,000ms. Set to 0 to wait forever.
    pub fn busy_timeout_ms(mut self, value: u32) -> Self {
        self.config.busy_timeout_ms = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// - `BuilderError::ZeroPollInterval` if the poll interval is 0
    /// - `BuilderError::TimeoutShorterThanPoll` if a non-zero timeout is
    ///   shorter than one poll interval
    pub fn build(self) -> Result<Config, BuilderError> {
        let config = self.config;
        if config.busy_poll_interval_ms == 0 {
            return Err(BuilderError::ZeroPollInterval);
        }
        if config.busy_timeout_ms != 0 && config.busy_timeout_ms < config.busy_poll_interval_ms {
            return Err(BuilderError::TimeoutShorterThanPoll {
                timeout_ms: config.busy_timeout_ms,
                poll_ms: config.busy_poll_interval_ms,
            });
        }
        Ok(config)
    }
}
