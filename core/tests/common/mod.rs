// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendars and messages shared by the workflow tests.

use almanac_core::Almanac;
use almanac_ical::DateOrDateTime;

/// Wraps components into a calendar, or into an iTIP message when `method`
/// is given.
#[must_use]
pub fn ics(method: Option<&str>, body: &str) -> String {
    let mut text = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//almanac//test//EN\r\n");
    if let Some(method) = method {
        text.push_str(&format!("METHOD:{method}\r\n"));
    }
    text.push_str(body);
    text.push_str("END:VCALENDAR\r\n");
    text
}

/// A daily series of ten occurrences at 09:00 UTC from 2024-03-01.
pub const DAILY_EVENT: &str = "BEGIN:VEVENT\r
UID:U1\r
DTSTAMP:20240201T000000Z\r
DTSTART:20240301T090000Z\r
DURATION:PT1H\r
RRULE:FREQ=DAILY;COUNT=10\r
ORGANIZER:mailto:owner@example.com\r
SUMMARY:Daily sync\r
END:VEVENT\r
";

/// An almanac holding [`DAILY_EVENT`] and `extra`.
#[must_use]
pub fn daily_almanac(extra: &str) -> Almanac {
    Almanac::parse(&ics(None, &format!("{DAILY_EVENT}{extra}"))).unwrap()
}

/// Override of the series occurrence on `day` of March 2024, moved one hour.
#[must_use]
pub fn moved_override(day: u8) -> String {
    format!(
        "BEGIN:VEVENT\r\nUID:U1\r\nDTSTAMP:20240201T000000Z\r\nRECURRENCE-ID:202403{day:02}T090000Z\r\nDTSTART:202403{day:02}T100000Z\r\nSUMMARY:Moved\r\nEND:VEVENT\r\n"
    )
}

/// Parses a value, UTC when it ends with `Z`, floating otherwise.
#[must_use]
pub fn at(text: &str) -> DateOrDateTime {
    DateOrDateTime::parse(text, None).unwrap()
}

/// Starts of the first `limit` occurrences of `uid`.
#[must_use]
pub fn starts(almanac: &Almanac, uid: &str, limit: usize) -> Vec<String> {
    almanac
        .stream_occurrences(uid, None)
        .unwrap()
        .take(limit)
        .map(|o| o.start.to_string())
        .collect()
}
