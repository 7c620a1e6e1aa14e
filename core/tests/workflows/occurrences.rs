// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Occurrence queries of a calendar view.

use almanac_core::Almanac;

use crate::common::{at, daily_almanac, ics, moved_override};

#[test]
fn stream_from_a_start_bound() {
    // Arrange
    let almanac = daily_almanac(&moved_override(6));

    // Act
    let occurrences: Vec<_> = almanac
        .stream_occurrences("U1", Some(&at("20240305T090000Z")))
        .unwrap()
        .take(3)
        .collect();

    // Assert
    assert_eq!(occurrences[0].start, at("20240305T090000Z"));
    assert_eq!(occurrences[1].start, at("20240306T100000Z"));
    assert_eq!(occurrences[1].recurrence_id, at("20240306T090000Z"));
    assert!(occurrences[1].is_override);
    assert_eq!(occurrences[2].start, at("20240307T090000Z"));
}

#[test]
fn unbounded_series_is_lazy() {
    // Arrange
    let almanac = Almanac::parse(&ics(
        None,
        "BEGIN:VEVENT\r\nUID:forever\r\nDTSTAMP:20240101T000000Z\r\nDTSTART;TZID=Europe/Berlin:20240101T080000\r\nRRULE:FREQ=WEEKLY;BYDAY=MO,FR\r\nEND:VEVENT\r\n",
    ))
    .unwrap();

    // Act
    let last = almanac
        .stream_occurrences("forever", None)
        .unwrap()
        .nth(999)
        .unwrap();

    // Assert - the Friday of the 500th week, still 08:00 Berlin time
    assert_eq!(last.start.tzid(), Some("Europe/Berlin"));
    assert_eq!(last.start.to_string(), "20330729T080000");
}

#[test]
fn closest_occurrence_is_stable_across_calls() {
    // Arrange
    let almanac = daily_almanac("");
    let target = at("20240307T120000Z");

    // Act
    let cold = almanac
        .closest_occurrence_on_or_before("U1", &target)
        .unwrap();
    let warm = almanac
        .closest_occurrence_on_or_before("U1", &target)
        .unwrap();

    // Assert
    assert_eq!(cold, warm);
    assert_eq!(cold.unwrap().start, at("20240307T090000Z"));
    let after_the_end = almanac
        .closest_occurrence_on_or_before("U1", &at("20250101T000000Z"))
        .unwrap()
        .unwrap();
    assert_eq!(after_the_end.start, at("20240310T090000Z"));
}
