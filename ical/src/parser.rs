// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{self, Display};

use crate::calendar::Calendar;
use crate::component::Component;
use crate::keyword::{KW_BEGIN, KW_END, KW_VCALENDAR};
use crate::property::Property;
use crate::syntax::{parse_line, unfold};

/// Error for text that holds no calendar at all.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No `BEGIN:VCALENDAR` line was found
    #[error("no VCALENDAR object found")]
    MissingCalendar,
}

/// A problem found while parsing that did not stop the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based number of the unfolded line
    pub line: usize,
    /// Path of the enclosing components, e.g. `VCALENDAR/VEVENT`
    pub element: String,
    /// What went wrong
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} in {}: {}", self.line, self.element, self.message)
    }
}

/// Result of [`parse`]: the calendar together with everything that was
/// skipped or looked suspicious on the way.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// The first calendar object of the text
    pub calendar: Calendar,
    /// Warnings in text order
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse the first iCalendar object of a text.
///
/// Parsing is lenient: lines that are not content lines, unknown property
/// names, stray `END` lines and missing `END` lines are reported as
/// [`Diagnostic`]s and parsing goes on. Unknown properties are kept so that
/// they are written back unchanged.
///
/// ## Errors
///
/// Fails only when the text has no `VCALENDAR` object.
///
/// ## Examples
///
/// ```
/// # use almanac_ical::parse;
/// let src = "\
/// BEGIN:VCALENDAR\r\n\
/// VERSION:2.0\r\n\
/// PRODID:-//example//example//EN\r\n\
/// BEGIN:VEVENT\r\n\
/// UID:1@example.com\r\n\
/// SUMMARY:Test Event\r\n\
/// END:VEVENT\r\n\
/// END:VCALENDAR\r\n\
/// ";
/// let parsed = parse(src)?;
/// assert_eq!(parsed.calendar.events().count(), 1);
/// assert!(parsed.diagnostics.is_empty());
/// # Ok::<(), almanac_ical::ParseError>(())
/// ```
pub fn parse(src: &str) -> Result<Parsed, ParseError> {
    let mut parser = Parser::default();
    for (index, line) in unfold(src).iter().enumerate() {
        parser.line(index + 1, line);
    }
    parser.finish()
}

#[derive(Debug, Default, PartialEq, Eq)]
enum State {
    #[default]
    Before,
    Inside,
    /// After the first calendar, `depth` counts the nesting of ignored objects
    After { depth: usize },
}

#[derive(Debug, Default)]
struct Parser {
    state: State,
    properties: Vec<Property>,
    components: Vec<Component>,
    stack: Vec<Component>,
    diagnostics: Vec<Diagnostic>,
    line: usize,
}

impl Parser {
    fn line(&mut self, number: usize, line: &str) {
        self.line = number;
        let property = match parse_line(line) {
            Ok(property) => property,
            Err(e) => {
                match self.state {
                    State::Inside => self.warn(format!("malformed line ignored: {e}")),
                    State::Before | State::After { depth: 0 } => {
                        self.warn(format!("content outside {KW_VCALENDAR} ignored: {e}"));
                    }
                    State::After { .. } => {}
                }
                return;
            }
        };

        if property.is(KW_BEGIN) {
            self.begin(property.value.trim());
        } else if property.is(KW_END) {
            self.end(property.value.trim());
        } else {
            self.property(property);
        }
    }

    fn begin(&mut self, name: &str) {
        match &mut self.state {
            State::Before if name.eq_ignore_ascii_case(KW_VCALENDAR) => self.state = State::Inside,
            State::Before => self.warn(format!("BEGIN:{name} outside VCALENDAR ignored")),
            State::Inside => self.stack.push(Component::with_name(name)),
            State::After { depth } => {
                if *depth == 0 && name.eq_ignore_ascii_case(KW_VCALENDAR) {
                    self.warn("additional VCALENDAR object ignored".to_string());
                }
                if let State::After { depth } = &mut self.state {
                    *depth += 1;
                }
            }
        }
    }

    fn end(&mut self, name: &str) {
        match &mut self.state {
            State::Inside => {}
            State::Before => {
                self.warn(format!("END:{name} outside VCALENDAR ignored"));
                return;
            }
            State::After { depth } => {
                *depth = depth.saturating_sub(1);
                return;
            }
        }

        if let Some(open) = self
            .stack
            .iter()
            .rposition(|c| c.name.eq_ignore_ascii_case(name))
        {
            while self.stack.len() > open + 1 {
                self.close_top(true);
            }
            self.close_top(false);
        } else if name.eq_ignore_ascii_case(KW_VCALENDAR) {
            while !self.stack.is_empty() {
                self.close_top(true);
            }
            self.state = State::After { depth: 0 };
        } else {
            self.warn(format!("END:{name} without matching BEGIN ignored"));
        }
    }

    fn property(&mut self, property: Property) {
        match self.state {
            State::Inside => {}
            State::Before | State::After { depth: 0 } => {
                self.warn(format!("{} outside {KW_VCALENDAR} ignored", property.name));
                return;
            }
            // part of an ignored object, which is reported once
            State::After { .. } => return,
        }

        if property.kind().is_none() && !property.is_x_name() {
            self.warn(format!("unrecognized property {} retained", property.name));
        }
        match self.stack.last_mut() {
            Some(component) => component.properties.push(property),
            None => self.properties.push(property),
        }
    }

    /// Pops the innermost open component into its parent.
    fn close_top(&mut self, unclosed: bool) {
        if unclosed {
            let name = self.stack.last().map(|c| c.name.clone()).unwrap_or_default();
            self.warn(format!("BEGIN:{name} is never closed"));
        }
        let Some(component) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(component),
            None => self.components.push(component),
        }
    }

    fn finish(mut self) -> Result<Parsed, ParseError> {
        match self.state {
            State::Before => return Err(ParseError::MissingCalendar),
            State::Inside => {
                while !self.stack.is_empty() {
                    self.close_top(true);
                }
                self.warn(format!("BEGIN:{KW_VCALENDAR} is never closed"));
            }
            State::After { .. } => {}
        }

        tracing::debug!(
            components = self.components.len(),
            diagnostics = self.diagnostics.len(),
            "parsed calendar"
        );
        Ok(Parsed {
            calendar: Calendar::from_parts(self.properties, self.components),
            diagnostics: self.diagnostics,
        })
    }

    fn warn(&mut self, message: String) {
        let element = match self.state {
            State::Inside => std::iter::once(KW_VCALENDAR)
                .chain(self.stack.iter().map(|c| c.name.as_str()))
                .collect::<Vec<_>>()
                .join("/"),
            State::Before | State::After { .. } => String::new(),
        };
        let diagnostic = Diagnostic {
            line: self.line,
            element,
            message,
        };
        tracing::warn!(%diagnostic, "ignored content");
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format;

    #[test]
    fn parses_nested_components() {
        let src = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:x\r\nBEGIN:VEVENT\r\nUID:1\r\nBEGIN:VALARM\r\nACTION:DISPLAY\r\nEND:VALARM\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let parsed = parse(src).unwrap();
        assert!(parsed.diagnostics.is_empty());
        let event = parsed.calendar.events().next().unwrap();
        assert_eq!(event.children.len(), 1);
        assert_eq!(event.children[0].name, "VALARM");
        assert_eq!(format(&parsed.calendar).unwrap(), src);
    }

    #[test]
    fn requires_a_calendar() {
        assert_eq!(
            parse("BEGIN:VEVENT\r\nEND:VEVENT\r\n").unwrap_err(),
            ParseError::MissingCalendar
        );
        assert_eq!(parse("").unwrap_err(), ParseError::MissingCalendar);
    }

    #[test]
    fn reports_and_recovers() {
        let src = "\
garbage before\r
BEGIN:VCALENDAR\r
VERSION:2.0\r
NOT A LINE\r
BEGIN:VEVENT\r
UID:1\r
COLOR:red\r
X-CUSTOM:kept\r
END:VTODO\r
END:VEVENT\r
BEGIN:VTODO\r
UID:2\r
END:VCALENDAR\r
BEGIN:VCALENDAR\r
BEGIN:VEVENT\r
SUMMARY:not read\r
END:VEVENT\r
END:VCALENDAR\r
X-TRAILER:after\r
trailing garbage\r
";
        let parsed = parse(src).unwrap();
        let [outside, malformed, rest @ .., trailing] = parsed.diagnostics.as_slice() else {
            panic!("expected diagnostics, got {:?}", parsed.diagnostics);
        };
        assert_eq!((outside.line, outside.element.as_str()), (1, ""));
        assert!(outside.message.starts_with("content outside VCALENDAR ignored"));
        assert_eq!((malformed.line, malformed.element.as_str()), (4, "VCALENDAR"));
        assert!(malformed.message.starts_with("malformed line ignored"));
        assert_eq!((trailing.line, trailing.element.as_str()), (20, ""));
        assert!(trailing.message.starts_with("content outside VCALENDAR ignored"));

        let messages: Vec<_> = rest
            .iter()
            .map(|d| (d.line, d.element.as_str(), d.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            [
                (7, "VCALENDAR/VEVENT", "unrecognized property COLOR retained"),
                (9, "VCALENDAR/VEVENT", "END:VTODO without matching BEGIN ignored"),
                (13, "VCALENDAR/VTODO", "BEGIN:VTODO is never closed"),
                (14, "", "additional VCALENDAR object ignored"),
                (19, "", "X-TRAILER outside VCALENDAR ignored"),
            ]
        );

        let cal = &parsed.calendar;
        assert_eq!(cal.components().len(), 2);
        let event = cal.events().next().unwrap();
        assert!(event.property("COLOR").is_some());
        assert!(event.property("X-CUSTOM").is_some());
        assert_eq!(cal.todos().next().unwrap().uid(), Some("2"));
    }

    #[test]
    fn unclosed_calendar_is_kept() {
        let parsed = parse("BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:1\n").unwrap();
        assert_eq!(parsed.calendar.events().count(), 1);
        assert_eq!(parsed.diagnostics.len(), 2);
    }
}
