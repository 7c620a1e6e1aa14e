// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! REQUEST workflows: updates of components the calendar already holds.

use almanac_core::{AlmanacError, ItipError};

use crate::common::{daily_almanac, ics, starts};

#[test]
fn request_updates_a_single_occurrence() {
    // Arrange
    let mut almanac = daily_almanac("");
    let message = ics(
        Some("REQUEST"),
        "BEGIN:VEVENT\r\nUID:U1\r\nDTSTAMP:20240202T000000Z\r\nRECURRENCE-ID:20240305T090000Z\r\nDTSTART:20240305T140000Z\r\nORGANIZER:mailto:owner@example.com\r\nSUMMARY:Afternoon sync\r\nEND:VEVENT\r\n",
    );

    // Act
    let log = almanac.process_itip(&message).unwrap();

    // Assert
    assert_eq!(
        log.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["SUCCESS: VEVENT U1 RECURRENCE-ID 20240305T090000Z added"]
    );
    let starts = starts(&almanac, "U1", 6);
    assert_eq!(starts[4], "20240305T140000Z");
    assert_eq!(starts[5], "20240306T090000Z");
}

#[test]
fn request_for_unknown_component_is_rejected() {
    // Arrange
    let mut almanac = daily_almanac("");
    let before = almanac.serialize().unwrap();
    let message = ics(
        Some("REQUEST"),
        "BEGIN:VEVENT\r\nUID:elsewhere\r\nDTSTAMP:20240202T000000Z\r\nDTSTART:20240305T140000Z\r\nEND:VEVENT\r\n",
    );

    // Act
    let result = almanac.process_itip(&message);

    // Assert
    assert!(matches!(
        result,
        Err(AlmanacError::Itip(ItipError::UnknownUid(_)))
    ));
    assert_eq!(almanac.serialize().unwrap(), before);
}

#[test]
fn request_with_attendees_is_rejected() {
    let mut almanac = daily_almanac("");
    let message = ics(
        Some("REQUEST"),
        "BEGIN:VEVENT\r\nUID:U1\r\nSEQUENCE:1\r\nATTENDEE:mailto:guest@example.com\r\nEND:VEVENT\r\n",
    );
    assert!(matches!(
        almanac.process_itip(&message),
        Err(AlmanacError::Itip(ItipError::AttendeesUnsupported(_)))
    ));
}
