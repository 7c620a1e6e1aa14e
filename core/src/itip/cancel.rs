// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use almanac_ical::{
    Calendar, Component, DateOrDateTime, DateTimeKind, RecurrenceIdRange, RecurrenceSet,
};

use crate::itip::{ItipError, Log, describe, describe_occurrence, invalid, unreadable};

/// Applies a `CANCEL` message.
///
/// A component without RECURRENCE-ID cancels its whole family. With a
/// RECURRENCE-ID it cancels the matching override, or else the generated
/// occurrence of the parent, optionally with every later one.
pub(super) fn cancel(
    calendar: &mut Calendar,
    message: &Calendar,
    log: &mut Log,
) -> Result<(), ItipError> {
    for component in message.components() {
        if !component.is_displayable() {
            log.warning(format!("{} ignored, it cannot be cancelled", component.name));
            continue;
        }

        let uid = component
            .uid()
            .ok_or_else(|| ItipError::MissingUid(component.name.clone()))?;
        match component.recurrence_id().map_err(invalid(component))? {
            None => cancel_family(calendar, uid, log),
            Some(recurrence_id) => cancel_instance(calendar, component, uid, &recurrence_id, log)?,
        }
    }
    Ok(())
}

fn cancel_family(calendar: &mut Calendar, uid: &str, log: &mut Log) {
    let removed = calendar.remove_where(|c| c.uid() == Some(uid));
    if removed.is_empty() {
        log.warning(format!("nothing to cancel for {uid}"));
    } else {
        log.success(format!("{uid} cancelled, {} component(s) removed", removed.len()));
    }
}

fn cancel_instance(
    calendar: &mut Calendar,
    component: &Component,
    uid: &str,
    recurrence_id: &DateOrDateTime,
    log: &mut Log,
) -> Result<(), ItipError> {
    let range = component.recurrence_range();
    if range == Some(RecurrenceIdRange::ThisAndPrior) {
        return Err(ItipError::UnsupportedRange(describe(component)));
    }

    if let Some(position) = calendar.position_of(uid, Some(recurrence_id)) {
        let stored = calendar
            .get(position)
            .map(Component::sequence)
            .unwrap_or_default();
        let incoming = component.sequence();
        if incoming < stored {
            return Err(ItipError::StaleSequence {
                target: describe(component),
                incoming,
                stored,
            });
        }
        let mut position_seen = 0;
        calendar.remove_where(|_| {
            let hit = position_seen == position;
            position_seen += 1;
            hit
        });
        log.success(format!("{} removed", describe(component)));
        return Ok(());
    }

    let occurrence = describe_occurrence(uid, recurrence_id);
    let (position, set) = {
        let Some(position) = calendar.position_of(uid, None) else {
            return Err(ItipError::NotAnOccurrence(occurrence));
        };
        let Some(parent) = calendar.get(position) else {
            return Err(ItipError::NotAnOccurrence(occurrence));
        };
        if !parent.is_occurrence(recurrence_id).map_err(unreadable(parent))? {
            return Err(ItipError::NotAnOccurrence(occurrence));
        }
        (position, parent.recurrence_set().map_err(unreadable(parent))?)
    };

    match range {
        Some(RecurrenceIdRange::ThisAndFuture) => {
            cancel_this_and_future(calendar, position, &set, uid, recurrence_id, log)
        }
        _ => {
            let exdate = recurrence_id.in_frame_of(&set.start);
            calendar.update(position, |parent| parent.add_exdate(&exdate));
            log.success(format!("{occurrence} cancelled, EXDATE {exdate} added"));
            Ok(())
        }
    }
}

fn cancel_this_and_future(
    calendar: &mut Calendar,
    position: usize,
    set: &RecurrenceSet,
    uid: &str,
    recurrence_id: &DateOrDateTime,
    log: &mut Log,
) -> Result<(), ItipError> {
    let previous = match calendar.get(position) {
        Some(parent) => parent
            .occurrence_before(recurrence_id)
            .map_err(unreadable(parent))?,
        None => None,
    };
    let Some(previous) = previous else {
        // nothing is left before the first occurrence
        cancel_family(calendar, uid, log);
        return Ok(());
    };

    let rule = match &set.rule {
        Some(rule) => {
            let mut rule = rule.clone();
            rule.set_until(Some(until_value(&set.start, &previous)))
                .map_err(|source| ItipError::InvalidValue {
                    target: uid.to_string(),
                    source,
                })?;
            rule.set_count(None);
            Some(rule)
        }
        None => None,
    };
    let cutoff = recurrence_id.instant();
    let exdates: Vec<&DateOrDateTime> = set
        .rdates
        .iter()
        .filter(|rdate| rdate.instant() >= cutoff)
        .collect();

    let sequence = calendar
        .get(position)
        .map_or(0, Component::sequence)
        .checked_add(1)
        .ok_or_else(|| ItipError::SequenceOverflow(uid.to_string()))?;

    calendar.update(position, |parent| {
        if rule.is_some() {
            parent.set_rrule(rule.as_ref());
        }
        for exdate in &exdates {
            parent.add_exdate(exdate);
        }
        parent.set_sequence(sequence);
    });
    log.success(format!(
        "{uid} cancelled from {recurrence_id}, last occurrence is {previous}, SEQUENCE {sequence}"
    ));

    for orphan in calendar.remove_orphaned_overrides() {
        log.success(format!("{} removed, no longer an occurrence", describe(&orphan)));
    }
    Ok(())
}

/// UNTIL for a rule that must end at `last`, with the value type of DTSTART.
fn until_value(start: &DateOrDateTime, last: &DateOrDateTime) -> DateOrDateTime {
    let last = last.in_frame_of(start);
    match start.kind() {
        DateTimeKind::Date => DateOrDateTime::Date(last.date()),
        DateTimeKind::Floating => DateOrDateTime::Floating(last.civil()),
        DateTimeKind::Utc | DateTimeKind::Zoned => last.to_utc(),
    }
}
