// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use almanac_ical::{Calendar, Component, ComponentKind};

use crate::itip::{ItipError, Log, describe, invalid};

/// Stores every component of a `PUBLISH` message.
///
/// A component replaces the stored one with the same UID and RECURRENCE-ID
/// when its SEQUENCE is newer, and is added otherwise. Time zones replace the
/// stored definition with the same TZID.
pub(super) fn publish(
    calendar: &mut Calendar,
    message: &Calendar,
    log: &mut Log,
) -> Result<(), ItipError> {
    for component in message.components() {
        match component.kind() {
            Some(ComponentKind::TimeZone) => publish_time_zone(calendar, component, log),
            Some(kind) if kind.is_displayable() => publish_component(calendar, component, log)?,
            _ => log.warning(format!("{} ignored, it cannot be published", component.name)),
        }
    }
    Ok(())
}

fn publish_component(
    calendar: &mut Calendar,
    component: &Component,
    log: &mut Log,
) -> Result<(), ItipError> {
    let target = describe(component);
    if !component.has_organizer() {
        log.warning(format!("{target} has no ORGANIZER"));
    }
    if component.has_attendees() {
        log.warning(format!("{target} has ATTENDEE, which PUBLISH does not expect"));
    }

    let uid = component
        .uid()
        .ok_or_else(|| ItipError::MissingUid(component.name.clone()))?;
    let recurrence_id = component.recurrence_id().map_err(invalid(component))?;

    match calendar.position_of(uid, recurrence_id.as_ref()) {
        Some(position) => {
            let stored = calendar
                .get(position)
                .map(Component::sequence)
                .unwrap_or_default();
            let incoming = component.sequence();
            // two unversioned copies are both at 0
            if incoming <= stored && !(incoming == 0 && stored == 0) {
                return Err(ItipError::StaleSequence {
                    target,
                    incoming,
                    stored,
                });
            }
            calendar.replace(position, component.clone());
            log.success(format!("{target} updated to SEQUENCE {incoming}"));
        }
        None => {
            calendar.add(component.clone());
            log.success(format!("{target} added"));
        }
    }

    for orphan in calendar.remove_orphaned_overrides() {
        log.success(format!("{} removed, no longer an occurrence", describe(&orphan)));
    }
    Ok(())
}

fn publish_time_zone(calendar: &mut Calendar, time_zone: &Component, log: &mut Log) {
    let Some(tzid) = time_zone.tzid() else {
        log.warning(format!("{} without TZID ignored", time_zone.name));
        return;
    };

    let stored = calendar
        .components()
        .iter()
        .position(|c| c.kind() == Some(ComponentKind::TimeZone) && c.tzid() == Some(tzid));
    match stored {
        Some(position) => {
            calendar.replace(position, time_zone.clone());
            log.success(format!("{} {tzid} replaced", time_zone.name));
        }
        None => {
            calendar.add(time_zone.clone());
            log.success(format!("{} {tzid} added", time_zone.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use almanac_ical::parse;

    use super::*;
    use crate::itip::ItipLog;

    fn calendar(body: &str) -> Calendar {
        let src = format!("BEGIN:VCALENDAR\nPRODID:x\nVERSION:2.0\n{body}END:VCALENDAR\n");
        parse(&src).unwrap().calendar
    }

    #[test]
    fn adds_and_warns() {
        let mut main = calendar("");
        let message = calendar("BEGIN:VEVENT\nUID:a\nATTENDEE:mailto:x@example.com\nEND:VEVENT\n");
        let mut log = Log::default();
        publish(&mut main, &message, &mut log).unwrap();

        assert!(main.contains_uid("a"));
        assert_eq!(
            log.0,
            [
                ItipLog::Warning("VEVENT a has no ORGANIZER".into()),
                ItipLog::Warning("VEVENT a has ATTENDEE, which PUBLISH does not expect".into()),
                ItipLog::Success("VEVENT a added".into()),
            ]
        );
    }

    #[test]
    fn unversioned_copies_replace_each_other() {
        let mut main = calendar("BEGIN:VEVENT\nUID:a\nSUMMARY:old\nEND:VEVENT\n");
        let message = calendar("BEGIN:VEVENT\nUID:a\nSUMMARY:new\nEND:VEVENT\n");
        publish(&mut main, &message, &mut Log::default()).unwrap();

        let stored = main.find("a", None).unwrap();
        assert_eq!(stored.property("SUMMARY").unwrap().value, "new");
        assert_eq!(main.components().len(), 1);
    }

    #[test]
    fn equal_sequence_is_stale() {
        let mut main = calendar("BEGIN:VEVENT\nUID:a\nSEQUENCE:2\nEND:VEVENT\n");
        let message = calendar("BEGIN:VEVENT\nUID:a\nSEQUENCE:2\nEND:VEVENT\n");
        assert_eq!(
            publish(&mut main, &message, &mut Log::default()),
            Err(ItipError::StaleSequence {
                target: "VEVENT a".into(),
                incoming: 2,
                stored: 2,
            })
        );
    }

    #[test]
    fn time_zones_are_replaced_by_tzid() {
        let mut main = calendar("BEGIN:VTIMEZONE\nTZID:Europe/Paris\nX-V:1\nEND:VTIMEZONE\n");
        let message = calendar("BEGIN:VTIMEZONE\nTZID:Europe/Paris\nX-V:2\nEND:VTIMEZONE\n");
        let mut log = Log::default();
        publish(&mut main, &message, &mut log).unwrap();

        let zones: Vec<_> = main.timezones().collect();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].property("X-V").unwrap().value, "2");
        assert_eq!(log.0, [ItipLog::Success("VTIMEZONE Europe/Paris replaced".into())]);
    }
}
