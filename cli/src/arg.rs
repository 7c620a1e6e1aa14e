// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use almanac_core::OutputFormat;
use almanac_ical::DateOrDateTime;
use clap::{Arg, ArgMatches, ValueHint, arg, value_parser};

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn file() -> Arg {
        arg!(<FILE> "Path to the iCalendar file")
            .value_parser(value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
    }

    pub fn get_file(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("FILE")
            .cloned()
            .unwrap_or_default()
    }

    pub fn uid(required: bool) -> Arg {
        arg!(--uid <UID> "UID of the component").required(required)
    }

    pub fn get_uid(matches: &ArgMatches) -> Option<String> {
        matches.get_one::<String>("uid").cloned()
    }

    pub fn tzid() -> Arg {
        arg!(--tzid <TZID> "Time zone of local date-times, e.g. Europe/Berlin")
    }

    pub fn get_tzid(matches: &ArgMatches) -> Option<String> {
        matches.get_one::<String>("tzid").cloned()
    }

    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format, defaults to the configured one")
            .value_parser(value_parser!(OutputFormat))
    }

    pub fn get_output_format(matches: &ArgMatches) -> Option<OutputFormat> {
        matches.get_one("output-format").copied()
    }
}

/// Parses a date or date-time given on the command line.
///
/// Both the iCalendar form (`20240105`, `20240105T090000Z`) and the ISO 8601
/// form (`2024-01-05`, `2024-01-05T09:00:00Z`, `2024-01-05 09:00`) are
/// accepted. Local date-times are floating unless `tzid` is given.
pub fn parse_datetime(text: &str, tzid: Option<&str>) -> Result<DateOrDateTime, String> {
    let mut compact: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | ':'))
        .map(|c| if c == ' ' { 'T' } else { c })
        .collect();

    // HHMM without seconds
    if let Some((_, time)) = compact.split_once('T') {
        let digits = time.trim_end_matches('Z').len();
        if digits == 4 {
            let at = compact.len() - usize::from(compact.ends_with('Z'));
            compact.insert_str(at, "00");
        }
    }

    DateOrDateTime::parse(&compact, tzid).map_err(|_| {
        format!(
            "Invalid date-time `{text}`. Expected formats: YYYY-MM-DD, YYYY-MM-DD HH:MM, YYYYMMDDTHHMMSS[Z]"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_forms() {
        let cases = [
            ("20240105", "20240105"),
            ("2024-01-05", "20240105"),
            ("20240105T090000Z", "20240105T090000Z"),
            ("2024-01-05T09:00:00Z", "20240105T090000Z"),
            ("2024-01-05 09:00", "20240105T090000"),
            ("2024-01-05T09:30Z", "20240105T093000Z"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_datetime(input, None).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_parse_datetime_with_tzid() {
        let value = parse_datetime("2024-01-05 09:00", Some("Europe/Berlin")).unwrap();
        assert_eq!(value.tzid(), Some("Europe/Berlin"));
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("tomorrow", None).is_err());
        assert!(parse_datetime("2024-13-01", None).is_err());
    }
}
