//! Panel state machine types
//!
//! The panel moves through [`PanelState`] strictly in order:
//!
//! ```text
//! PoweredOff -> Resetting -> Initializing -> Ready <-> Streaming(M|S)
//!                                               |
//!                                               +-> Refreshing -> Ready
//!                                               |
//!                                               +-> Sleeping
//!
//! Sleeping | Refreshing --reset--> Initializing
//! any state --power_off--> PoweredOff
//! ```
//!
//! Each public [`Panel`](crate::Panel) operation is an [`Operation`] that
//! is only permitted from certain states.

use core::fmt;

use crate::command::Target;

/// One of the two panel controllers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    /// Left half of the columns
    Master,
    /// Right half of the columns
    Slave,
}

impl Controller {
    /// Chip-select target addressing only this controller
    pub const fn target(self) -> Target {
        match self {
            Self::Master => Target::Master,
            Self::Slave => Target::Slave,
        }
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Slave => write!(f, "slave"),
        }
    }
}

/// Power and streaming state of the controller pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelState {
    /// Power-enable released, controllers unpowered
    #[default]
    PoweredOff,
    /// Powered, waiting for the reset pulse
    Resetting,
    /// Reset done, waiting for the register table
    Initializing,
    /// Configured and idle
    Ready,
    /// A half-frame is open on the given controller
    Streaming(Controller),
    /// A refresh is in progress or was interrupted
    Refreshing,
    /// Both controllers in deep sleep
    Sleeping,
}

impl PanelState {
    /// Whether `operation` may start from this state
    pub const fn permits(self, operation: Operation) -> bool {
        match operation {
            Operation::PowerOn => matches!(self, Self::PoweredOff),
            Operation::Reset => !matches!(self, Self::PoweredOff | Self::Streaming(_)),
            Operation::Init => matches!(self, Self::Initializing),
            Operation::Command
            | Operation::BeginFrame
            | Operation::Refresh
            | Operation::Clear
            | Operation::Sleep => matches!(self, Self::Ready),
            Operation::WriteLine | Operation::EndFrame => matches!(self, Self::Streaming(_)),
            Operation::PowerOff => true,
        }
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoweredOff => write!(f, "powered off"),
            Self::Resetting => write!(f, "awaiting reset"),
            Self::Initializing => write!(f, "awaiting init"),
            Self::Ready => write!(f, "ready"),
            Self::Streaming(controller) => write!(f, "streaming to {controller}"),
            Self::Refreshing => write!(f, "refreshing"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// Public panel operations, for state checks and error reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// `power_on`
    PowerOn,
    /// `send_command` and `send_register`
    Command,
    /// `reset`
    Reset,
    /// `init`
    Init,
    /// `begin_frame`
    BeginFrame,
    /// `write_line`
    WriteLine,
    /// `end_frame`
    EndFrame,
    /// `refresh`
    Refresh,
    /// `clear`
    Clear,
    /// `sleep`
    Sleep,
    /// `power_off`
    PowerOff,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PowerOn => "power on",
            Self::Command => "command",
            Self::Reset => "reset",
            Self::Init => "init",
            Self::BeginFrame => "begin frame",
            Self::WriteLine => "write line",
            Self::EndFrame => "end frame",
            Self::Refresh => "refresh",
            Self::Clear => "clear",
            Self::Sleep => "sleep",
            Self::PowerOff => "power off",
        };
        f.write_str(name)
    }
}
