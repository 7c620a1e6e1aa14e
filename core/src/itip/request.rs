// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use almanac_ical::{Calendar, ComponentKind};

use crate::itip::{ItipError, Log, describe, publish};

/// Applies a `REQUEST` message.
///
/// Without attendees a request can only revise components the calendar
/// already holds, after which it behaves like a publish. Every component is
/// checked before anything is stored.
pub(super) fn request(
    calendar: &mut Calendar,
    message: &Calendar,
    log: &mut Log,
) -> Result<(), ItipError> {
    for component in message.components() {
        if component.kind() == Some(ComponentKind::TimeZone) {
            continue;
        }

        let target = describe(component);
        if component.has_attendees() {
            return Err(ItipError::AttendeesUnsupported(target));
        }
        let uid = component
            .uid()
            .ok_or_else(|| ItipError::MissingUid(component.name.clone()))?;
        if !calendar.contains_uid(uid) {
            return Err(ItipError::UnknownUid(target));
        }
    }

    publish::publish(calendar, message, log)
}

#[cfg(test)]
mod tests {
    use almanac_ical::parse;

    use super::*;

    fn calendar(body: &str) -> Calendar {
        let src = format!("BEGIN:VCALENDAR\nPRODID:x\nVERSION:2.0\n{body}END:VCALENDAR\n");
        parse(&src).unwrap().calendar
    }

    #[test]
    fn new_components_are_rejected() {
        let mut main = calendar("BEGIN:VEVENT\nUID:a\nEND:VEVENT\n");
        let message = calendar("BEGIN:VEVENT\nUID:b\nEND:VEVENT\n");
        assert_eq!(
            request(&mut main, &message, &mut Log::default()),
            Err(ItipError::UnknownUid("VEVENT b".into()))
        );
    }

    #[test]
    fn attendees_are_rejected() {
        let mut main = calendar("BEGIN:VEVENT\nUID:a\nEND:VEVENT\n");
        let message =
            calendar("BEGIN:VEVENT\nUID:a\nSEQUENCE:1\nATTENDEE:mailto:x@example.com\nEND:VEVENT\n");
        assert_eq!(
            request(&mut main, &message, &mut Log::default()),
            Err(ItipError::AttendeesUnsupported("VEVENT a".into()))
        );
    }

    #[test]
    fn revises_existing_components() {
        let mut main = calendar("BEGIN:VEVENT\nUID:a\nSUMMARY:old\nEND:VEVENT\n");
        let message = calendar(
            "BEGIN:VEVENT\nUID:a\nSEQUENCE:1\nORGANIZER:mailto:o@example.com\nSUMMARY:new\nEND:VEVENT\n",
        );
        let mut log = Log::default();
        request(&mut main, &message, &mut log).unwrap();

        assert_eq!(main.parent("a").unwrap().sequence(), 1);
        assert_eq!(log.0.len(), 1);
    }
}
