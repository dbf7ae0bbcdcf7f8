//! Panel command definitions
//!
//! This module defines the opcodes understood by the two panel controllers
//! and the fixed vendor register table used to bring them up.
//!
//! ## Command Structure
//!
//! Every command follows the same framing:
//! 1. Assert CS of the addressed controller(s)
//! 2. Send the opcode byte
//! 3. Send the parameter bytes (if any)
//! 4. Deassert all CS lines
//!
//! The controllers tell opcode and parameters apart by position in the
//! chip-select window; the DC line stays parked at data level.
//!
//! ## Example
//!
//! ```
//! use epd_13in3e::command::{Register, Target, INIT_SEQUENCE};
//!
//! let tres = Register::ResolutionSetting;
//! assert_eq!(tres.opcode(), 0x61);
//! assert_eq!(tres.params(), &[0x04, 0xB0, 0x06, 0x40]);
//! assert_eq!(tres.target(), Target::Both);
//!
//! assert_eq!(INIT_SEQUENCE.first(), Some(&Register::AnalogTiming));
//! ```

/// Panel setting command (0x00)
pub const PSR: u8 = 0x00;

/// Power setting command (0x01)
///
/// Configures the shared analog rails. Master only.
pub const PWR: u8 = 0x01;

/// Power off command (0x02)
///
/// Switches the charge pumps off after a refresh.
pub const POF: u8 = 0x02;

/// Power on command (0x04)
///
/// BUSY goes low until the rails are up.
pub const PON: u8 = 0x04;

/// Booster soft-start, negative rail (0x05)
pub const BTST_N: u8 = 0x05;

/// Booster soft-start, positive rail (0x06)
pub const BTST_P: u8 = 0x06;

/// Deep sleep command (0x07)
///
/// Requires the check byte [`DEEP_SLEEP_CHECK`]. Only a hardware reset wakes
/// the controller.
pub const DSLP: u8 = 0x07;

/// Data start transmission command (0x10)
///
/// Followed by the controller's full half-frame of packed pixels.
pub const DTM: u8 = 0x10;

/// Display refresh command (0x12)
///
/// BUSY goes low for the whole refresh (up to ~20 s).
pub const DRF: u8 = 0x12;

/// VCOM and data interval setting (0x50)
pub const CDI: u8 = 0x50;

/// TCON setting (0x60)
pub const TCON: u8 = 0x60;

/// Resolution setting (0x61)
pub const TRES: u8 = 0x61;

/// Analog timing control (0x74)
pub const AN_TM: u8 = 0x74;

/// AGID setting (0x86)
pub const AGID: u8 = 0x86;

/// Buck/boost VDDN control (0xB0)
pub const BUCK_BOOST_VDDN: u8 = 0xB0;

/// TFT VCOM power control (0xB1)
pub const TFT_VCOM_POWER: u8 = 0xB1;

/// Enable output buffer (0xB6)
pub const EN_BUF: u8 = 0xB6;

/// Boost VDDP enable (0xB7)
pub const BOOST_VDDP_EN: u8 = 0xB7;

/// Cascade setting (0xE0)
pub const CCSET: u8 = 0xE0;

/// Power saving (0xE3)
pub const PWS: u8 = 0xE3;

/// Vendor unlock command (0xF0)
pub const CMD66: u8 = 0xF0;

/// Check byte required by [`DSLP`]
pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

/// Which controller(s) a command is addressed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Master controller only (left half)
    Master,
    /// Slave controller only (right half)
    Slave,
    /// Both controllers at once
    Both,
}

/// Named vendor registers with their fixed parameter blocks
///
/// The parameter bytes are opaque vendor constants and are reproduced
/// byte-for-byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// AN_TM (0x74)
    AnalogTiming,
    /// CMD66 (0xF0)
    Cmd66,
    /// PSR (0x00)
    PanelSetting,
    /// CDI (0x50)
    VcomDataInterval,
    /// TCON (0x60)
    TimingControl,
    /// AGID (0x86)
    Agid,
    /// PWS (0xE3)
    PowerSaving,
    /// CCSET (0xE0)
    Cascade,
    /// TRES (0x61), fixed to 1200x1600
    ResolutionSetting,
    /// PWR (0x01)
    PowerSetting,
    /// EN_BUF (0xB6)
    EnableBuffer,
    /// BTST_P (0x06)
    BoosterPositive,
    /// BOOST_VDDP_EN (0xB7)
    BoostVddpEnable,
    /// BTST_N (0x05)
    BoosterNegative,
    /// BUCK_BOOST_VDDN (0xB0)
    BuckBoostVddn,
    /// TFT_VCOM_POWER (0xB1)
    TftVcomPower,
    /// PON (0x04)
    PowerOn,
    /// DRF (0x12)
    DisplayRefresh,
    /// POF (0x02)
    PowerOff,
    /// DSLP (0x07)
    DeepSleep,
}

impl Register {
    /// Opcode byte for this register
    pub const fn opcode(self) -> u8 {
        match self {
            Self::AnalogTiming => AN_TM,
            Self::Cmd66 => CMD66,
            Self::PanelSetting => PSR,
            Self::VcomDataInterval => CDI,
            Self::TimingControl => TCON,
            Self::Agid => AGID,
            Self::PowerSaving => PWS,
            Self::Cascade => CCSET,
            Self::ResolutionSetting => TRES,
            Self::PowerSetting => PWR,
            Self::EnableBuffer => EN_BUF,
            Self::BoosterPositive => BTST_P,
            Self::BoostVddpEnable => BOOST_VDDP_EN,
            Self::BoosterNegative => BTST_N,
            Self::BuckBoostVddn => BUCK_BOOST_VDDN,
            Self::TftVcomPower => TFT_VCOM_POWER,
            Self::PowerOn => PON,
            Self::DisplayRefresh => DRF,
            Self::PowerOff => POF,
            Self::DeepSleep => DSLP,
        }
    }

    /// Fixed parameter bytes sent after the opcode
    pub const fn params(self) -> &'static [u8] {
        match self {
            Self::AnalogTiming => &[0xC0, 0x1C, 0x1C, 0xCC, 0xCC, 0xCC, 0x15, 0x15, 0x55],
            Self::Cmd66 => &[0x49, 0x55, 0x13, 0x5D, 0x05, 0x10],
            Self::PanelSetting => &[0xDF, 0x69],
            Self::VcomDataInterval => &[0xF7],
            Self::TimingControl => &[0x03, 0x03],
            Self::Agid => &[0x10],
            Self::PowerSaving => &[0x22],
            Self::Cascade => &[0x01],
            // 0x04B0 = 1200 sources, 0x0640 = 1600 gates
            Self::ResolutionSetting => &[0x04, 0xB0, 0x06, 0x40],
            Self::PowerSetting => &[0x0F, 0x00, 0x28, 0x2C, 0x28, 0x38],
            Self::EnableBuffer => &[0x07],
            Self::BoosterPositive => &[0xE8, 0x28],
            Self::BoostVddpEnable => &[0x01],
            Self::BoosterNegative => &[0xE8, 0x28],
            Self::BuckBoostVddn => &[0x01],
            Self::TftVcomPower => &[0x02],
            Self::PowerOn => &[],
            Self::DisplayRefresh => &[0x00],
            Self::PowerOff => &[0x00],
            Self::DeepSleep => &[DEEP_SLEEP_CHECK],
        }
    }

    /// Controller(s) the register is written to
    ///
    /// The analog rail and booster registers go to the Master only.
    pub const fn target(self) -> Target {
        match self {
            Self::AnalogTiming
            | Self::PowerSetting
            | Self::EnableBuffer
            | Self::BoosterPositive
            | Self::BoostVddpEnable
            | Self::BoosterNegative
            | Self::BuckBoostVddn
            | Self::TftVcomPower => Target::Master,
            Self::Cmd66
            | Self::PanelSetting
            | Self::VcomDataInterval
            | Self::TimingControl
            | Self::Agid
            | Self::PowerSaving
            | Self::Cascade
            | Self::ResolutionSetting
            | Self::PowerOn
            | Self::DisplayRefresh
            | Self::PowerOff
            | Self::DeepSleep => Target::Both,
        }
    }
}

/// Register writes performed by `init`, in order
pub const INIT_SEQUENCE: [Register; 16] = [
    Register::AnalogTiming,
    Register::Cmd66,
    Register::PanelSetting,
    Register::VcomDataInterval,
    Register::TimingControl,
    Register::Agid,
    Register::PowerSaving,
    Register::Cascade,
    Register::ResolutionSetting,
    Register::PowerSetting,
    Register::EnableBuffer,
    Register::BoosterPositive,
    Register::BoostVddpEnable,
    Register::BoosterNegative,
    Register::BuckBoostVddn,
    Register::TftVcomPower,
];
