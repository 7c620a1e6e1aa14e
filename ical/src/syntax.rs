// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Content lines as defined in RFC 5545 Section 3.1.
//!
//! ```txt
//! contentline = name *(";" param ) ":" value CRLF
//! name        = iana-token / x-name
//! param       = param-name "=" param-value *("," param-value)
//! param-value = paramtext / quoted-string
//! paramtext   = *SAFE-CHAR
//! quoted-string = DQUOTE *QSAFE-CHAR DQUOTE
//! ```
//!
//! Lines are unfolded first, then the name and parameters are lexed. The
//! value is everything after the first colon outside of a quoted string and
//! is sliced from the line verbatim.

pub mod lexer;

use std::io::{self, Write};
use std::iter::Peekable;
use std::ops::Range;

use crate::formatter::{FormatOptions, Formatter};
use crate::parameter::{Parameter, ParameterValue};
use crate::property::Property;
use crate::syntax::lexer::{Token, tokenize};

/// Error for a line that does not match `NAME[;PARAMS]:VALUE`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// The line is empty
    #[error("empty content line")]
    Empty,

    /// The line does not start with a property name
    #[error("expected property name at byte {position}")]
    MissingName {
        /// Byte offset in the unfolded line
        position: usize,
    },

    /// A token that is not allowed at this position
    #[error("unexpected {found} at byte {position}, expected {expected}")]
    Unexpected {
        /// Byte offset in the unfolded line
        position: usize,
        /// Description of what was found
        found: String,
        /// Description of what was expected
        expected: &'static str,
    },

    /// A quoted parameter value without its closing quote
    #[error("unterminated quoted parameter value starting at byte {position}")]
    UnterminatedQuote {
        /// Byte offset of the opening quote
        position: usize,
    },

    /// The line ended before the `:` separating the value
    #[error("missing ':' before property value")]
    MissingColon,
}

/// Splits raw text into logical lines, reversing line folding.
///
/// CRLF and bare LF are both accepted as line terminators. A physical line
/// starting with a space or tab continues the previous logical line. Blank
/// lines are dropped.
#[must_use]
pub fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for physical in raw.split('\n') {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        if let Some(continuation) = physical.strip_prefix([' ', '\t'])
            && let Some(last) = lines.last_mut()
        {
            last.push_str(continuation);
        } else if !physical.is_empty() {
            lines.push(physical.to_string());
        }
    }
    lines
}

/// Folds one logical line into physical lines of at most 75 octets, joined by
/// CRLF and a single space. The result has no trailing line break.
///
/// Folding never splits a UTF-8 sequence.
#[must_use]
pub fn fold(line: &str) -> String {
    // writing into a Vec does not fail and folding keeps UTF-8 intact
    fold_to_string(line).unwrap_or_else(|_| line.to_owned())
}

fn fold_to_string(line: &str) -> io::Result<String> {
    let mut buffer = Vec::with_capacity(line.len() + line.len() / 32);
    Formatter::new(&mut buffer, FormatOptions::default()).write_all(line.as_bytes())?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Parses one unfolded content line into a [`Property`].
///
/// # Errors
///
/// Returns a [`SyntaxError`] when the line does not have the shape
/// `NAME[;PARAM=VALUE[,VALUE]...]*:VALUE`.
pub fn parse_line(line: &str) -> Result<Property, SyntaxError> {
    if line.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let mut tokens = tokenize(line).peekable();
    let name = match tokens.next() {
        Some((Token::Word(name), _)) if !name.contains('_') => name.to_string(),
        Some((_, span)) => return Err(SyntaxError::MissingName { position: span.start }),
        None => return Err(SyntaxError::Empty),
    };

    let mut parameters = Vec::new();
    loop {
        match tokens.next() {
            Some((Token::Colon, span)) => {
                let value = line.get(span.end..).unwrap_or_default().to_string();
                return Ok(Property {
                    name,
                    parameters,
                    value,
                });
            }
            Some((Token::Semicolon, _)) => parameters.push(parse_parameter(line, &mut tokens)?),
            Some((found, span)) => {
                return Err(SyntaxError::Unexpected {
                    position: span.start,
                    found: found.to_string(),
                    expected: "';' or ':'",
                });
            }
            None => return Err(SyntaxError::MissingColon),
        }
    }
}

fn parse_parameter<'a, I>(line: &'a str, tokens: &mut Peekable<I>) -> Result<Parameter, SyntaxError>
where
    I: Iterator<Item = (Token<'a>, Range<usize>)>,
{
    let name = match tokens.next() {
        Some((Token::Word(name), _)) => name.to_string(),
        Some((found, span)) => {
            return Err(SyntaxError::Unexpected {
                position: span.start,
                found: found.to_string(),
                expected: "parameter name",
            });
        }
        None => return Err(SyntaxError::MissingColon),
    };

    match tokens.next() {
        Some((Token::Equal, _)) => {}
        Some((found, span)) => {
            return Err(SyntaxError::Unexpected {
                position: span.start,
                found: found.to_string(),
                expected: "'='",
            });
        }
        None => return Err(SyntaxError::MissingColon),
    }

    let mut values = vec![parse_parameter_value(line, tokens)?];
    while let Some((Token::Comma, _)) = tokens.peek() {
        tokens.next();
        values.push(parse_parameter_value(line, tokens)?);
    }
    Ok(Parameter { name, values })
}

fn parse_parameter_value<'a, I>(
    line: &'a str,
    tokens: &mut Peekable<I>,
) -> Result<ParameterValue, SyntaxError>
where
    I: Iterator<Item = (Token<'a>, Range<usize>)>,
{
    if let Some((Token::DQuote, open)) = tokens.peek().cloned() {
        tokens.next();
        for (token, span) in tokens.by_ref() {
            match token {
                Token::DQuote => {
                    let value = line.get(open.end..span.start).unwrap_or_default();
                    return Ok(ParameterValue {
                        value: value.to_string(),
                        quoted: true,
                    });
                }
                Token::Error => {
                    return Err(SyntaxError::Unexpected {
                        position: span.start,
                        found: token.to_string(),
                        expected: "quoted text",
                    });
                }
                _ => {}
            }
        }
        return Err(SyntaxError::UnterminatedQuote {
            position: open.start,
        });
    }

    // paramtext may be empty, so the value ends at the first separator
    let mut range: Option<Range<usize>> = None;
    while let Some((token, span)) = tokens.peek().cloned() {
        match token {
            Token::Comma | Token::Colon | Token::Semicolon => break,
            Token::DQuote | Token::Error => {
                return Err(SyntaxError::Unexpected {
                    position: span.start,
                    found: token.to_string(),
                    expected: "parameter text",
                });
            }
            Token::Equal | Token::Symbol(_) | Token::Word(_) | Token::UnicodeText(_) => {
                range = Some(range.map_or(span.clone(), |r| r.start..span.end));
                tokens.next();
            }
        }
    }

    let value = range
        .and_then(|r| line.get(r))
        .unwrap_or_default()
        .to_string();
    Ok(ParameterValue {
        value,
        quoted: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfolds_crlf_and_lf() {
        let raw = "BEGIN:VCALENDAR\r\nSUMMARY:Long\r\n  text\r\n\tmore\nEND:VCALENDAR\n";
        assert_eq!(
            unfold(raw),
            ["BEGIN:VCALENDAR", "SUMMARY:Long textmore", "END:VCALENDAR"]
        );
    }

    #[test]
    fn folds_at_75_octets() {
        let line = format!("DESCRIPTION:{}", "x".repeat(200));
        let folded = fold(&line);
        for physical in folded.split("\r\n") {
            assert!(physical.len() <= 75, "{} octets", physical.len());
        }
        assert!(folded.split("\r\n").skip(1).all(|l| l.starts_with(' ')));
        assert_eq!(unfold(&folded), [line]);
    }

    #[test]
    fn folds_without_splitting_utf8() {
        let line = format!("SUMMARY:{}", "日本語".repeat(30));
        let folded = fold(&line);
        for physical in folded.split("\r\n") {
            assert!(physical.len() <= 75);
        }
        assert_eq!(unfold(&folded), [line]);
    }

    #[test]
    fn short_lines_are_not_folded() {
        assert_eq!(fold("UID:abc"), "UID:abc");
        let exact = format!("X:{}", "y".repeat(73));
        assert_eq!(fold(&exact), exact);
    }

    #[test]
    fn fold_reverses_unfold() {
        let raw = format!("DESCRIPTION:{}\r\n {}", "a".repeat(63), "b".repeat(40));
        let lines = unfold(&raw);
        assert_eq!(lines.len(), 1);
        assert_eq!(fold(&lines[0]), raw);
    }

    #[test]
    fn parses_simple_line() {
        let prop = parse_line("SUMMARY:Team meeting").unwrap();
        assert_eq!(prop.name, "SUMMARY");
        assert!(prop.parameters.is_empty());
        assert_eq!(prop.value, "Team meeting");
    }

    #[test]
    fn splits_on_first_unquoted_colon() {
        let line = r#"ATTENDEE;CN="Doe: J";ROLE=REQ-PARTICIPANT:mailto:doe@example.com"#;
        let prop = parse_line(line).unwrap();
        assert_eq!(prop.parameter_value("CN"), Some("Doe: J"));
        assert_eq!(prop.parameter_value("role"), Some("REQ-PARTICIPANT"));
        assert_eq!(prop.value, "mailto:doe@example.com");
        assert_eq!(prop.to_string(), line);
    }

    #[test]
    fn parses_multi_valued_parameters() {
        let line = r#"ATTENDEE;MEMBER="mailto:a@x.org","mailto:b@x.org";X-EMPTY=:mailto:c@x.org"#;
        let prop = parse_line(line).unwrap();
        let member = prop.parameter("MEMBER").unwrap();
        assert_eq!(member.values.len(), 2);
        assert_eq!(member.values[1].value, "mailto:b@x.org");
        assert_eq!(prop.parameter_value("X-EMPTY"), Some(""));
        assert_eq!(prop.to_string(), line);
    }

    #[test]
    fn keeps_value_verbatim() {
        for line in [
            r"DESCRIPTION:a\, b\; c\\ d\n e",
            "X-CUSTOM;X-P=a=b:value;with:colons,and commas",
            "SUMMARY:",
            "SUMMARY;LANGUAGE=ja:日本語",
        ] {
            assert_eq!(parse_line(line).unwrap().to_string(), line);
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line(""), Err(SyntaxError::Empty));
        assert_eq!(parse_line("NO_COLON"), Err(SyntaxError::MissingName { position: 0 }));
        assert_eq!(parse_line("NOCOLON"), Err(SyntaxError::MissingColon));
        assert!(matches!(
            parse_line(":value"),
            Err(SyntaxError::MissingName { position: 0 })
        ));
        assert!(matches!(
            parse_line(r#"A;B="open:value"#),
            Err(SyntaxError::UnterminatedQuote { .. })
        ));
        assert!(matches!(
            parse_line("A;B:value"),
            Err(SyntaxError::Unexpected { .. })
        ));
        assert!(matches!(
            parse_line("A B:value"),
            Err(SyntaxError::Unexpected { .. })
        ));
    }
}
