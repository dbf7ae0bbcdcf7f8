//! Color codes for the 6-color panel
//!
//! This module defines the [`Color`] enum and the packed pixel format used on
//! the wire and in controller RAM.
//!
//! ## Pixel Representation
//!
//! Each byte packs two horizontal pixels, high nibble first:
//!
//! | Color  | Code |
//! |--------|------|
//! | Black  | 0x0  |
//! | White  | 0x1  |
//! | Yellow | 0x2  |
//! | Red    | 0x3  |
//! | Blue   | 0x5  |
//! | Green  | 0x6  |
//!
//! Codes 0x4 and 0x7 are not documented for this panel and are rejected.
//!
//! ## Example
//!
//! ```
//! use epd_13in3e::Color;
//!
//! assert_eq!(Color::White.packed(), 0x11);
//! assert_eq!(Color::pack(Color::Black, Color::Blue), 0x05);
//! assert!(Color::try_from(0x4).is_err());
//! ```

/// Colors supported by the panel
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Color {
    /// Black pixels
    Black = 0x0,
    /// White pixels
    White = 0x1,
    /// Yellow pixels
    Yellow = 0x2,
    /// Red pixels
    Red = 0x3,
    /// Blue pixels
    Blue = 0x5,
    /// Green pixels
    Green = 0x6,
}

/// Nibble that does not name one of the six panel colors
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid color code {0:#x}")]
pub struct InvalidColorCode(pub u8);

impl Color {
    /// Every valid color, in code order
    pub const ALL: [Self; 6] = [
        Self::Black,
        Self::White,
        Self::Yellow,
        Self::Red,
        Self::Blue,
        Self::Green,
    ];

    /// 4-bit color code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Byte holding two pixels of this color
    ///
    /// ```
    /// use epd_13in3e::Color;
    ///
    /// assert_eq!(Color::Green.packed(), 0x66);
    /// ```
    pub const fn packed(self) -> u8 {
        Self::pack(self, self)
    }

    /// Byte holding `left` in the high nibble and `right` in the low nibble
    pub const fn pack(left: Self, right: Self) -> u8 {
        (left.code() << 4) | right.code()
    }

    /// Split a packed byte into its (left, right) pixels
    ///
    /// # Errors
    ///
    /// Returns [`InvalidColorCode`] for the first nibble that is not a color.
    pub fn unpack(byte: u8) -> Result<(Self, Self), InvalidColorCode> {
        Ok((Self::try_from(byte >> 4)?, Self::try_from(byte & 0x0F)?))
    }
}

impl TryFrom<u8> for Color {
    type Error = InvalidColorCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x0 => Ok(Self::Black),
            0x1 => Ok(Self::White),
            0x2 => Ok(Self::Yellow),
            0x3 => Ok(Self::Red),
            0x5 => Ok(Self::Blue),
            0x6 => Ok(Self::Green),
            other => Err(InvalidColorCode(other)),
        }
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> Self {
        color.code()
    }
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Color {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU4;
}

#[cfg(feature = "graphics")]
impl From<Color> for embedded_graphics_core::pixelcolor::Rgb888 {
    fn from(color: Color) -> Self {
        use embedded_graphics_core::pixelcolor::{Rgb888, RgbColor};

        match color {
            Color::Black => Rgb888::BLACK,
            Color::White => Rgb888::WHITE,
            Color::Yellow => Rgb888::YELLOW,
            Color::Red => Rgb888::RED,
            Color::Blue => Rgb888::BLUE,
            Color::Green => Rgb888::GREEN,
        }
    }
}

#[cfg(feature = "graphics")]
impl TryFrom<embedded_graphics_core::pixelcolor::Rgb888> for Color {
    type Error = embedded_graphics_core::pixelcolor::Rgb888;

    /// Exact match only; anything else is handed back unchanged
    fn try_from(rgb: embedded_graphics_core::pixelcolor::Rgb888) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|color| embedded_graphics_core::pixelcolor::Rgb888::from(*color) == rgb)
            .ok_or(rgb)
    }
}
