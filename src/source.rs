//! Scanline sources for half-frame streaming
//!
//! A full image is never held in memory. The panel pulls one
//! [`HALF_LINE_BYTES`](crate::config::HALF_LINE_BYTES) scanline at a time from
//! a [`LineSource`]: `HEIGHT` lines for the Master half, then `HEIGHT` lines
//! for the Slave half.
//!
//! ## Example
//!
//! ```
//! use epd_13in3e::{Color, LineSource, ReaderSource, SolidSource};
//!
//! let image = [0x11u8; 600];
//! let mut reader = ReaderSource::new(&image[..]);
//! let mut line = [0u8; 300];
//! assert!(reader.read_line(&mut line).is_ok());
//! assert!(reader.read_line(&mut line).is_ok());
//! assert!(reader.read_line(&mut line).is_err());
//!
//! let mut solid = SolidSource::new(Color::Red);
//! assert!(solid.read_line(&mut line).is_ok());
//! assert_eq!(line[0], 0x33);
//! ```

use core::convert::Infallible;
use core::fmt::Debug;

use embedded_io::{Read, ReadExactError};

use crate::color::Color;

/// Producer of packed scanlines
///
/// Sources are finite and not restartable. An error means the stream ended
/// or failed; the panel stops pulling and closes the open half-frame.
pub trait LineSource {
    /// Error type for a failed or short read
    type Error: Debug;

    /// Fill `line` completely with the next scanline
    fn read_line(&mut self, line: &mut [u8]) -> Result<(), Self::Error>;
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    type Error = S::Error;

    fn read_line(&mut self, line: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_line(line)
    }
}

/// Line source over a byte stream in wire format
///
/// Works with anything implementing [`embedded_io::Read`], such as an HTTP
/// response body or a byte slice.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    lines_read: u32,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader positioned at the first byte of the image
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            lines_read: 0,
        }
    }

    /// Number of complete lines delivered so far
    pub fn lines_read(&self) -> u32 {
        self.lines_read
    }

    /// Give back the reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> LineSource for ReaderSource<R> {
    /// `UnexpectedEof` when the stream ends mid-image
    type Error = ReadExactError<R::Error>;

    fn read_line(&mut self, line: &mut [u8]) -> Result<(), Self::Error> {
        self.reader.read_exact(line)?;
        self.lines_read += 1;
        Ok(())
    }
}

/// Line source backed by a generator closure
///
/// The closure receives the running line index (0-based across both halves)
/// and the buffer to fill.
///
/// ```
/// use epd_13in3e::{Color, FnSource, LineSource};
///
/// // Alternate black and white rows
/// let mut stripes = FnSource::new(|row, line: &mut [u8]| {
///     let color = if row % 2 == 0 { Color::Black } else { Color::White };
///     line.fill(color.packed());
/// });
/// let mut line = [0xFFu8; 4];
/// let _ = stripes.read_line(&mut line);
/// assert_eq!(line, [0x00; 4]);
/// ```
pub struct FnSource<F> {
    generate: F,
    row: u32,
}

impl<F: FnMut(u32, &mut [u8])> FnSource<F> {
    /// Wrap a generator
    pub fn new(generate: F) -> Self {
        Self { generate, row: 0 }
    }
}

impl<F: FnMut(u32, &mut [u8])> LineSource for FnSource<F> {
    type Error = Infallible;

    fn read_line(&mut self, line: &mut [u8]) -> Result<(), Self::Error> {
        (self.generate)(self.row, line);
        self.row = self.row.wrapping_add(1);
        Ok(())
    }
}

/// Endless source of one color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolidSource {
    byte: u8,
}

impl SolidSource {
    /// Lines filled with `color` in both nibbles
    pub const fn new(color: Color) -> Self {
        Self {
            byte: color.packed(),
        }
    }
}

impl LineSource for SolidSource {
    type Error = Infallible;

    fn read_line(&mut self, line: &mut [u8]) -> Result<(), Self::Error> {
        line.fill(self.byte);
        Ok(())
    }
}
