// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! CANCEL workflows against a daily series.

use almanac_core::{AlmanacError, ItipError};

use crate::common::{at, daily_almanac, ics, moved_override, starts};

fn cancel_message(recurrence_id: &str) -> String {
    ics(
        Some("CANCEL"),
        &format!(
            "BEGIN:VEVENT\r\nUID:U1\r\nDTSTAMP:20240202T000000Z\r\nSEQUENCE:1\r\n{recurrence_id}\r\nEND:VEVENT\r\n"
        ),
    )
}

#[test]
fn cancel_single_instance() {
    // Arrange
    let mut almanac = daily_almanac("");

    // Act
    let log = almanac
        .process_itip(&cancel_message("RECURRENCE-ID:20240303T090000Z"))
        .unwrap();

    // Assert
    let log: Vec<String> = log.iter().map(ToString::to_string).collect();
    assert_eq!(
        log,
        ["SUCCESS: U1 at 20240303T090000Z cancelled, EXDATE 20240303T090000Z added"]
    );
    let parent = almanac.calendar().parent("U1").unwrap();
    assert_eq!(parent.exdates().unwrap(), [at("20240303T090000Z")]);
    let starts = starts(&almanac, "U1", 20);
    assert_eq!(starts.len(), 9);
    assert!(!starts.contains(&"20240303T090000Z".to_string()));
    assert!(starts.contains(&"20240304T090000Z".to_string()));
}

#[test]
fn cancel_this_and_future() {
    // Arrange
    let overrides = [3, 6, 8].map(moved_override).concat();
    let mut almanac = daily_almanac(&overrides);

    // Act
    let log = almanac
        .process_itip(&cancel_message(
            "RECURRENCE-ID;RANGE=THISANDFUTURE:20240305T090000Z",
        ))
        .unwrap();

    // Assert - the rule now ends the day before
    let parent = almanac.calendar().parent("U1").unwrap();
    let rule = parent.rrule().unwrap().unwrap();
    assert_eq!(rule.until(), Some(&at("20240304T090000Z")));
    assert_eq!(rule.count(), None);
    assert_eq!(parent.sequence(), 1);

    // Assert - overrides from the cancelled day on are gone
    let remaining: Vec<_> = almanac
        .calendar()
        .overrides("U1")
        .map(|c| c.recurrence_id().unwrap().unwrap())
        .collect();
    assert_eq!(remaining, [at("20240303T090000Z")]);
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|l| l.to_string().starts_with("SUCCESS: ")));

    assert_eq!(
        starts(&almanac, "U1", 20),
        [
            "20240301T090000Z",
            "20240302T090000Z",
            "20240303T100000Z",
            "20240304T090000Z",
        ]
    );
}

#[test]
fn cancel_moved_override() {
    // Arrange
    let mut almanac = daily_almanac(&moved_override(4));

    // Act
    almanac
        .process_itip(&cancel_message("RECURRENCE-ID:20240304T090000Z"))
        .unwrap();

    // Assert - the override is gone, the occurrence is not restored by it
    assert_eq!(almanac.calendar().overrides("U1").count(), 0);
    assert!(almanac.calendar().parent("U1").is_some());
}

#[test]
fn cancel_whole_series() {
    // Arrange
    let mut almanac = daily_almanac(&moved_override(2));

    // Act
    let log = almanac
        .process_itip(&ics(
            Some("CANCEL"),
            "BEGIN:VEVENT\r\nUID:U1\r\nDTSTAMP:20240202T000000Z\r\nEND:VEVENT\r\n",
        ))
        .unwrap();

    // Assert
    assert!(!almanac.calendar().contains_uid("U1"));
    assert_eq!(log[0].to_string(), "SUCCESS: U1 cancelled, 2 component(s) removed");
}

#[test]
fn failed_cancel_leaves_calendar_unchanged() {
    // Arrange
    let mut almanac = daily_almanac("");
    let before = almanac.serialize().unwrap();
    let message = ics(
        Some("CANCEL"),
        "BEGIN:VEVENT\r\nUID:U1\r\nRECURRENCE-ID:20240302T090000Z\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:U1\r\nRECURRENCE-ID:20240302T093000Z\r\nEND:VEVENT\r\n",
    );

    // Act
    let result = almanac.process_itip(&message);

    // Assert - the first component was valid, but nothing was kept
    assert!(matches!(
        result,
        Err(AlmanacError::Itip(ItipError::NotAnOccurrence(_)))
    ));
    assert_eq!(almanac.serialize().unwrap(), before);
}
