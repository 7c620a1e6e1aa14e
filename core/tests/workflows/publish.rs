// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! PUBLISH workflows.

use almanac_core::{Almanac, AlmanacError, ItipError, ItipLog};

use crate::common::{daily_almanac, ics, moved_override, starts};

fn revision(sequence: u32, rule: &str) -> String {
    ics(
        Some("PUBLISH"),
        &format!(
            "BEGIN:VEVENT\r\nUID:U1\r\nDTSTAMP:20240202T000000Z\r\nSEQUENCE:{sequence}\r\nDTSTART:20240301T090000Z\r\n{rule}\r\nORGANIZER:mailto:owner@example.com\r\nSUMMARY:Daily sync\r\nEND:VEVENT\r\n"
        ),
    )
}

#[test]
fn publish_into_empty_calendar() {
    // Arrange
    let mut almanac = Almanac::parse(&ics(None, "")).unwrap();
    let message = ics(
        Some("PUBLISH"),
        "BEGIN:VEVENT\r\nUID:new\r\nDTSTAMP:20240202T000000Z\r\nDTSTART;VALUE=DATE:20240310\r\nEND:VEVENT\r\n",
    );

    // Act
    let log = almanac.process_itip(&message).unwrap();

    // Assert
    assert_eq!(
        log,
        [
            ItipLog::Warning("VEVENT new has no ORGANIZER".into()),
            ItipLog::Success("VEVENT new added".into()),
        ]
    );
    assert_eq!(starts(&almanac, "new", 5), ["20240310"]);
}

#[test]
fn stale_sequence_is_rejected() {
    // Arrange
    let mut almanac = daily_almanac("");
    almanac
        .process_itip(&revision(1, "RRULE:FREQ=DAILY;COUNT=5"))
        .unwrap();
    let before = almanac.serialize().unwrap();

    // Act
    let result = almanac.process_itip(&revision(1, "RRULE:FREQ=DAILY;COUNT=2"));

    // Assert
    assert!(matches!(
        result,
        Err(AlmanacError::Itip(ItipError::StaleSequence {
            incoming: 1,
            stored: 1,
            ..
        }))
    ));
    assert_eq!(almanac.serialize().unwrap(), before);
    assert_eq!(starts(&almanac, "U1", 20).len(), 5);
}

#[test]
fn first_versions_replace_each_other() {
    // Arrange
    let mut almanac = daily_almanac("");

    // Act
    let log = almanac
        .process_itip(&revision(0, "RRULE:FREQ=DAILY;COUNT=3"))
        .unwrap();

    // Assert
    assert_eq!(log, [ItipLog::Success("VEVENT U1 updated to SEQUENCE 0".into())]);
    assert_eq!(almanac.calendar().components().len(), 1);
    assert_eq!(starts(&almanac, "U1", 20).len(), 3);
}

#[test]
fn shrinking_rule_removes_orphaned_overrides() {
    // Arrange
    let mut almanac = daily_almanac(&[2, 7].map(moved_override).concat());

    // Act
    let log = almanac
        .process_itip(&revision(1, "RRULE:FREQ=DAILY;UNTIL=20240303T090000Z"))
        .unwrap();

    // Assert
    assert_eq!(
        log,
        [
            ItipLog::Success("VEVENT U1 updated to SEQUENCE 1".into()),
            ItipLog::Success(
                "VEVENT U1 RECURRENCE-ID 20240307T090000Z removed, no longer an occurrence".into()
            ),
        ]
    );
    assert_eq!(
        starts(&almanac, "U1", 20),
        ["20240301T090000Z", "20240302T100000Z", "20240303T090000Z"]
    );
}

#[test]
fn unsupported_method_is_rejected() {
    let mut almanac = daily_almanac("");
    let result = almanac.process_itip(&ics(Some("REPLY"), ""));
    assert!(matches!(
        result,
        Err(AlmanacError::Itip(ItipError::UnsupportedMethod(method))) if method == "REPLY"
    ));
}
