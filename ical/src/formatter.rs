// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! iCalendar (RFC 5545) formatter module.
//!
//! This module writes calendars back to the RFC 5545 text format, to any
//! `std::io::Write` implementer. Lines end in CRLF and are folded at 75
//! octets unless configured otherwise.
//!
//! # Example
//!
//! ```
//! use almanac_ical::{formatter::format, parse};
//!
//! let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//x//y//EN\r\nEND:VCALENDAR\r\n";
//! let parsed = parse(input)?;
//! assert_eq!(format(&parsed.calendar)?, input);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{self, Write};

use crate::calendar::Calendar;
use crate::component::Component;
use crate::keyword::{KW_BEGIN, KW_END, KW_VCALENDAR};
use crate::property::Property;

/// Convenience function to format a [`Calendar`] to a `String` (uses default options).
///
/// # Errors
///
/// Returns an error if writing to the internal buffer fails or if the output
/// contains invalid UTF-8 data.
pub fn format(calendar: &Calendar) -> io::Result<String> {
    FormatOptions::default().write_to_string(calendar)
}

/// Formatting options for the iCalendar formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Maximum line length in octets before folding.
    /// - `None`: no line folding
    /// - `Some(n)`: fold lines longer than n octets
    ///
    /// Default: `Some(75)` for RFC 5545 compliance.
    pub folding: Option<usize>,

    /// Line folding style.
    ///
    /// Default: `FoldingStyle::Space` (CRLF + SPACE).
    pub folding_style: FoldingStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            folding: Some(75),
            folding_style: FoldingStyle::default(),
        }
    }
}

impl FormatOptions {
    /// Set the line folding option.
    #[must_use]
    pub fn folding(mut self, folding: Option<usize>) -> Self {
        self.folding = folding;
        self
    }

    /// Set the line folding style.
    #[must_use]
    pub const fn folding_style(mut self, style: FoldingStyle) -> Self {
        self.folding_style = style;
        self
    }

    /// Write a [`Calendar`] to any `Write` implementer.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write(&self, calendar: &Calendar, w: &mut impl Write) -> io::Result<()> {
        Formatter::new(w, *self).write_calendar(calendar)
    }

    /// Write a [`Calendar`] to a `String`.
    ///
    /// # Errors
    /// Returns an error if writing fails or if the output contains invalid UTF-8 data.
    pub fn write_to_string(&self, calendar: &Calendar) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write(calendar, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Line folding style for RFC 5545 formatting.
///
/// RFC 5545 specifies that folded lines should start with CRLF followed by
/// a whitespace character (SPACE or TAB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FoldingStyle {
    /// CRLF + SPACE (RFC 5545 default)
    #[default]
    Space,
    /// CRLF + TAB
    Tab,
}

impl FoldingStyle {
    const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Space => b"\r\n ",
            Self::Tab => b"\r\n\t",
        }
    }

    /// Both SPACE and TAB are 1 byte
    const fn continuation_len() -> usize {
        1
    }
}

/// iCalendar formatter that writes to any `Write` implementer.
///
/// Raw bytes written through the `Write` impl are folded; [`Formatter::writeln`]
/// terminates the current content line.
#[derive(Debug)]
pub struct Formatter<W: Write> {
    writer: W,
    options: FormatOptions,
    /// Current line length in bytes (excluding the pending CRLF).
    line_length: usize,
}

impl<W: Write> Formatter<W> {
    /// Create a new formatter with options.
    #[must_use]
    pub fn new(writer: W, options: FormatOptions) -> Self {
        Self {
            writer,
            options,
            line_length: 0,
        }
    }

    /// Consumes this formatter, returning the underlying writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Write a whole `VCALENDAR` object.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_calendar(&mut self, calendar: &Calendar) -> io::Result<()> {
        self.write_begin_block(KW_VCALENDAR)?;
        for property in &calendar.properties {
            self.write_property(property)?;
        }
        for component in calendar.components() {
            self.write_component(component)?;
        }
        self.write_end_block(KW_VCALENDAR)
    }

    /// Write one component and its sub-components.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_component(&mut self, component: &Component) -> io::Result<()> {
        self.write_begin_block(&component.name)?;
        for property in &component.properties {
            self.write_property(property)?;
        }
        for child in &component.children {
            self.write_component(child)?;
        }
        self.write_end_block(&component.name)
    }

    /// Write one folded content line.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_property(&mut self, property: &Property) -> io::Result<()> {
        write!(self, "{property}")?;
        self.writeln()
    }

    fn write_begin_block(&mut self, name: &str) -> io::Result<()> {
        write!(self, "{KW_BEGIN}:{name}")?;
        self.writeln()
    }

    fn write_end_block(&mut self, name: &str) -> io::Result<()> {
        write!(self, "{KW_END}:{name}")?;
        self.writeln()
    }

    /// Write a CRLF line ending.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn writeln(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\r\n")?;
        self.line_length = 0;
        Ok(())
    }

    /// Insert line folding: CRLF + whitespace.
    fn insert_fold(&mut self) -> io::Result<()> {
        self.writer
            .write_all(self.options.folding_style.as_bytes())?;
        self.line_length = FoldingStyle::continuation_len();
        Ok(())
    }
}

impl<W: Write> Write for Formatter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(max_len) = self.options.folding else {
            // Folding disabled, write directly
            return self.writer.write(buf);
        };

        let mut remaining = buf;
        while !remaining.is_empty() {
            if self.line_length >= max_len {
                self.insert_fold()?;
            }

            let available = max_len.saturating_sub(self.line_length);
            let mut len = find_safe_write_length(remaining, available);
            if len == 0 {
                if self.line_length > FoldingStyle::continuation_len() {
                    // the next character does not fit on this line
                    self.insert_fold()?;
                    continue;
                }
                // the limit is narrower than one character, overflow it
                len = char_len(remaining);
            }

            let (head, tail) = remaining.split_at(len.min(remaining.len()));
            self.writer.write_all(head)?;
            self.line_length += head.len();
            remaining = tail;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Find the maximum number of bytes we can write without breaking a UTF-8 sequence.
///
/// UTF-8 continuation bytes look like `10xxxxxx`; a cut is only made in
/// front of a byte that is not one of those.
fn find_safe_write_length(buf: &[u8], max_bytes: usize) -> usize {
    if max_bytes >= buf.len() {
        return buf.len();
    }

    let mut pos = max_bytes;
    while pos > 0 && buf.get(pos).is_some_and(|b| (b & 0xC0) == 0x80) {
        pos -= 1;
    }
    pos
}

/// Length of the UTF-8 sequence at the start of `buf`.
fn char_len(buf: &[u8]) -> usize {
    1 + buf
        .iter()
        .skip(1)
        .take_while(|b| (**b & 0xC0) == 0x80)
        .count()
}
