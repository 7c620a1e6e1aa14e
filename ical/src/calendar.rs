// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The `VCALENDAR` object, RFC 5545 Section 3.4.
//!
//! Components are kept in the order they were read. Components sharing a
//! UID form a family: one parent without RECURRENCE-ID and any number of
//! overrides of single occurrences. The UID index is rebuilt by every method
//! that changes the component list, so it never disagrees with it.

use std::collections::HashMap;

use crate::component::{Component, ComponentKind};
use crate::keyword::{KW_METHOD, KW_PRODID, KW_RECURRENCE_ID, KW_VERSION};
use crate::property::Property;
use crate::recurrence::{Occurrences, RecurrenceError};
use crate::value::DateOrDateTime;

/// An iCalendar object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calendar {
    /// Calendar properties such as `PRODID` and `VERSION`, in order.
    pub properties: Vec<Property>,

    components: Vec<Component>,

    /// UID to positions in `components`
    index: HashMap<String, Vec<usize>>,
}

impl Calendar {
    /// Creates an empty calendar with `VERSION:2.0` and the given `PRODID`.
    #[must_use]
    pub fn new(prodid: &str) -> Self {
        Self {
            properties: vec![
                Property::new(KW_PRODID, prodid),
                Property::new(KW_VERSION, "2.0"),
            ],
            ..Self::default()
        }
    }

    /// Creates a calendar from properties and components.
    #[must_use]
    pub fn from_parts(properties: Vec<Property>, components: Vec<Component>) -> Self {
        let mut calendar = Self {
            properties,
            components,
            index: HashMap::new(),
        };
        calendar.reindex();
        calendar
    }

    /// Every component, in order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Consumes the calendar, returning its components.
    #[must_use]
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Returns the first calendar property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is(name))
    }

    /// `METHOD`, present on scheduling messages.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.property(KW_METHOD).map(|p| p.value.as_str())
    }

    /// Events
    pub fn events(&self) -> impl Iterator<Item = &Component> {
        self.of_kind(ComponentKind::Event)
    }

    /// To-dos
    pub fn todos(&self) -> impl Iterator<Item = &Component> {
        self.of_kind(ComponentKind::Todo)
    }

    /// Journal entries
    pub fn journals(&self) -> impl Iterator<Item = &Component> {
        self.of_kind(ComponentKind::Journal)
    }

    /// Time zone definitions
    pub fn timezones(&self) -> impl Iterator<Item = &Component> {
        self.of_kind(ComponentKind::TimeZone)
    }

    fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(move |c| c.kind() == Some(kind))
    }

    /// Appends a component and returns its position.
    pub fn add(&mut self, component: Component) -> usize {
        let position = self.components.len();
        if let Some(uid) = component.uid() {
            self.index
                .entry(uid.to_string())
                .or_default()
                .push(position);
        }
        self.components.push(component);
        position
    }

    /// Puts `component` at `position`, returning the component it replaces.
    pub fn replace(&mut self, position: usize, component: Component) -> Option<Component> {
        let slot = self.components.get_mut(position)?;
        let old = std::mem::replace(slot, component);
        self.reindex();
        Some(old)
    }

    /// Removes every component matching `predicate`, returning them in order.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Component) -> bool) -> Vec<Component> {
        let (removed, kept) = std::mem::take(&mut self.components)
            .into_iter()
            .partition(|c| predicate(c));
        self.components = kept;
        self.reindex();
        removed
    }

    /// Changes the component at `position` in place.
    pub fn update<R>(&mut self, position: usize, f: impl FnOnce(&mut Component) -> R) -> Option<R> {
        let result = f(self.components.get_mut(position)?);
        self.reindex();
        Some(result)
    }

    /// Component at `position`
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Component> {
        self.components.get(position)
    }

    /// Positions of every component with this UID.
    #[must_use]
    pub fn positions(&self, uid: &str) -> &[usize] {
        self.index.get(uid).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every component with this UID: the parent and its overrides.
    pub fn family<'a>(&'a self, uid: &str) -> impl Iterator<Item = &'a Component> {
        self.positions(uid)
            .iter()
            .filter_map(|position| self.components.get(*position))
    }

    /// Whether any component has this UID.
    #[must_use]
    pub fn contains_uid(&self, uid: &str) -> bool {
        !self.positions(uid).is_empty()
    }

    /// Position of the component with this UID and RECURRENCE-ID; `None`
    /// for `recurrence_id` selects the parent.
    ///
    /// RECURRENCE-ID values match by instant.
    #[must_use]
    pub fn position_of(&self, uid: &str, recurrence_id: Option<&DateOrDateTime>) -> Option<usize> {
        self.positions(uid).iter().copied().find(|position| {
            let Some(component) = self.components.get(*position) else {
                return false;
            };
            match (component.recurrence_id(), recurrence_id) {
                (Ok(None), None) => !component.is_override(),
                (Ok(Some(found)), Some(wanted)) => found.instant() == wanted.instant(),
                _ => false,
            }
        })
    }

    /// The component with this UID and RECURRENCE-ID, see
    /// [`Calendar::position_of`].
    #[must_use]
    pub fn find(&self, uid: &str, recurrence_id: Option<&DateOrDateTime>) -> Option<&Component> {
        self.position_of(uid, recurrence_id)
            .and_then(|position| self.components.get(position))
    }

    /// The component with this UID and no RECURRENCE-ID.
    #[must_use]
    pub fn parent(&self, uid: &str) -> Option<&Component> {
        self.find(uid, None)
    }

    /// Every component with this UID and a RECURRENCE-ID.
    pub fn overrides<'a>(&'a self, uid: &str) -> impl Iterator<Item = &'a Component> {
        self.family(uid).filter(|c| c.is_override())
    }

    /// Streams the occurrences of `component` at or after `from`.
    ///
    /// For a parent, the RECURRENCE-ID of every override in this calendar is
    /// left out: those occurrences are replaced by the overrides themselves.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn occurrences<'a>(
        &self,
        component: &'a Component,
        from: Option<&DateOrDateTime>,
    ) -> Result<Occurrences<'a>, RecurrenceError> {
        let stream = component.occurrences(from)?;
        let Some(uid) = component.uid().filter(|_| !component.is_override()) else {
            return Ok(stream);
        };

        let overridden: Vec<DateOrDateTime> = self
            .overrides(uid)
            .filter_map(|c| c.recurrence_id().ok().flatten())
            .collect();
        Ok(stream.excluding(&overridden))
    }

    /// The latest occurrence of `component` at or before `target`.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn closest_occurrence_on_or_before(
        &self,
        component: &Component,
        target: &DateOrDateTime,
    ) -> Result<Option<DateOrDateTime>, RecurrenceError> {
        component.closest_start_on_or_before(target)
    }

    /// Positions of overrides whose RECURRENCE-ID is no longer an occurrence
    /// of their parent. Overrides still waiting for their parent are kept.
    #[must_use]
    pub fn orphaned_overrides(&self) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| self.is_orphan(c))
            .map(|(position, _)| position)
            .collect()
    }

    /// Removes the overrides reported by [`Calendar::orphaned_overrides`].
    pub fn remove_orphaned_overrides(&mut self) -> Vec<Component> {
        let orphans = self.orphaned_overrides();
        if orphans.is_empty() {
            return Vec::new();
        }

        let mut position = 0;
        let removed = self.remove_where(|_| {
            let orphan = orphans.contains(&position);
            position += 1;
            orphan
        });
        for component in &removed {
            tracing::debug!(uid = component.uid(), "removed orphaned override");
        }
        removed
    }

    fn is_orphan(&self, component: &Component) -> bool {
        let (Some(uid), Ok(Some(recurrence_id))) = (component.uid(), component.recurrence_id())
        else {
            return false;
        };
        let Some(parent) = self.parent(uid) else {
            return false;
        };
        // an unreadable parent cannot prove anything
        parent.is_occurrence(&recurrence_id).is_ok_and(|found| !found)
    }

    /// Returns human-readable violations of RFC 5545 for the calendar and
    /// everything in it.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for required in [KW_PRODID, KW_VERSION] {
            if self.property(required).is_none() {
                errors.push(format!("{required} is required"));
            }
        }

        let mut seen = Vec::new();
        for component in &self.components {
            let label = match component.uid() {
                Some(uid) => format!("{} {uid}", component.name),
                None => component.name.clone(),
            };
            errors.extend(
                component
                    .errors()
                    .into_iter()
                    .map(|e| format!("{label}: {e}")),
            );

            let Some(uid) = component.uid() else {
                continue;
            };
            let recurrence_id = component.recurrence_id().ok().flatten();
            let key = (uid, recurrence_id.as_ref().map(DateOrDateTime::instant));
            if seen.contains(&key) {
                errors.push(format!("{label}: duplicate UID and RECURRENCE-ID"));
            } else {
                seen.push(key);
            }

            if let Some(recurrence_id) = &recurrence_id
                && let Some(parent) = self.parent(uid)
            {
                if let Ok(Some(start)) = parent.dtstart()
                    && start.is_date() != recurrence_id.is_date()
                {
                    errors.push(format!(
                        "{label}: {KW_RECURRENCE_ID} must have the same value type as the DTSTART of its parent"
                    ));
                } else if self.is_orphan(component) {
                    errors.push(format!(
                        "{label}: {KW_RECURRENCE_ID} {recurrence_id} is not an occurrence of its parent"
                    ));
                }
            }
        }
        errors
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (position, component) in self.components.iter().enumerate() {
            if let Some(uid) = component.uid() {
                self.index
                    .entry(uid.to_string())
                    .or_default()
                    .push(position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const TEXT: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//test//test//EN\r
BEGIN:VEVENT\r
UID:u1\r
DTSTAMP:20240101T000000Z\r
DTSTART:20240101T100000\r
RRULE:FREQ=DAILY;COUNT=10\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:u1\r
DTSTAMP:20240101T000000Z\r
RECURRENCE-ID:20240103T100000\r
DTSTART:20240103T150000\r
END:VEVENT\r
BEGIN:VTODO\r
UID:t1\r
DTSTAMP:20240101T000000Z\r
END:VTODO\r
END:VCALENDAR\r
";

    fn calendar() -> Calendar {
        parse(TEXT).unwrap().calendar
    }

    fn dt(text: &str) -> DateOrDateTime {
        DateOrDateTime::parse(text, None).unwrap()
    }

    #[test]
    fn indexes_families() {
        let cal = calendar();
        assert_eq!(cal.events().count(), 2);
        assert_eq!(cal.todos().count(), 1);
        assert_eq!(cal.positions("u1"), [0, 1]);
        assert_eq!(cal.family("u1").count(), 2);
        assert!(!cal.parent("u1").unwrap().is_override());
        assert_eq!(cal.overrides("u1").count(), 1);
        assert_eq!(cal.position_of("u1", Some(&dt("20240103T100000"))), Some(1));
        assert_eq!(cal.position_of("u1", Some(&dt("20240104T100000"))), None);
        assert!(!cal.contains_uid("missing"));
    }

    #[test]
    fn index_follows_mutation() {
        let mut cal = calendar();
        let removed = cal.remove_where(|c| c.uid() == Some("t1"));
        assert_eq!(removed.len(), 1);
        assert!(!cal.contains_uid("t1"));

        let journal =
            Component::new(ComponentKind::Journal).with_property(Property::new("UID", "j1"));
        let position = cal.add(journal);
        assert_eq!(cal.positions("j1"), [position]);

        cal.update(position, |c| c.set_property(Property::new("UID", "j2")));
        assert!(!cal.contains_uid("j1"));
        assert_eq!(cal.positions("j2"), [position]);

        let old = cal.replace(0, Component::new(ComponentKind::Event)).unwrap();
        assert_eq!(old.uid(), Some("u1"));
        assert_eq!(cal.positions("u1"), [1]);
    }

    #[test]
    fn calendar_occurrences_skip_overridden() {
        let cal = calendar();
        let parent = cal.parent("u1").unwrap();
        let values: Vec<_> = cal
            .occurrences(parent, None)
            .unwrap()
            .take(3)
            .map(|v| v.to_string())
            .collect();
        assert_eq!(values, ["20240101T100000", "20240102T100000", "20240104T100000"]);
        // the component alone still has every occurrence
        assert_eq!(parent.occurrences(None).unwrap().count(), 10);
    }

    #[test]
    fn removes_orphaned_overrides() {
        let mut cal = calendar();
        assert!(cal.orphaned_overrides().is_empty());

        cal.update(0, |c| {
            let mut rule = c.rrule().unwrap().unwrap();
            rule.set_count(Some(2));
            c.set_rrule(Some(&rule));
        });
        assert_eq!(cal.orphaned_overrides(), [1]);
        let removed = cal.remove_orphaned_overrides();
        assert_eq!(removed.len(), 1);
        assert_eq!(cal.family("u1").count(), 1);
    }

    #[test]
    fn validates_calendar() {
        let cal = calendar();
        assert_eq!(cal.errors(), Vec::<String>::new());

        let mut cal = Calendar::from_parts(Vec::new(), cal.into_components());
        cal.add(
            Component::new(ComponentKind::Event)
                .with_property(Property::new("UID", "u1"))
                .with_property(Property::new("DTSTAMP", "20240101T000000Z"))
                .with_property(Property::new("DTSTART", "20240101T100000"))
                .with_property(Property::new("RECURRENCE-ID", "20240105")),
        );
        let errors = cal.errors();
        assert!(errors.contains(&"PRODID is required".to_string()));
        assert!(errors.contains(&"VERSION is required".to_string()));
        assert!(errors.iter().any(|e| e.contains("same value type as the DTSTART")));
    }
}
