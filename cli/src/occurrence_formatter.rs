// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use almanac_core::{Occurrence, OutputFormat};
use colored::Color;

use crate::table::{Column, PaddingDirection, Table};

/// Prints occurrences of one component.
#[derive(Debug)]
pub struct OccurrenceFormatter {
    uid: String,
    format: OutputFormat,
}

impl OccurrenceFormatter {
    pub fn new(uid: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            uid: uid.into(),
            format,
        }
    }

    pub fn format<'a>(&'a self, occurrences: &'a [Occurrence]) -> OccurrencesDisplay<'a> {
        OccurrencesDisplay {
            formatter: self,
            occurrences,
        }
    }
}

#[derive(Debug)]
pub struct OccurrencesDisplay<'a> {
    formatter: &'a OccurrenceFormatter,
    occurrences: &'a [Occurrence],
}

impl fmt::Display for OccurrencesDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formatter.format {
            OutputFormat::Json => {
                let rows: Vec<JsonRow<'_>> = self
                    .occurrences
                    .iter()
                    .map(|o| JsonRow {
                        uid: &self.formatter.uid,
                        start: o.start.to_string(),
                        tzid: o.start.tzid(),
                        recurrence_id: o.recurrence_id.to_string(),
                        is_override: o.is_override,
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&rows).map_err(|_| fmt::Error)?;
                writeln!(f, "{json}")
            }
            OutputFormat::Table => {
                let columns = [
                    OccurrenceColumn::Index,
                    OccurrenceColumn::Start,
                    OccurrenceColumn::RecurrenceId,
                ];
                let rows: Vec<(usize, &Occurrence)> =
                    self.occurrences.iter().enumerate().collect();
                let table = Table {
                    columns: &columns,
                    separator: "  ",
                    header: true,
                    data: &rows,
                };
                write!(f, "{table}")
            }
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct JsonRow<'a> {
    uid: &'a str,
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tzid: Option<&'a str>,
    recurrence_id: String,
    is_override: bool,
}

#[derive(Debug, Clone, Copy)]
enum OccurrenceColumn {
    Index,
    Start,
    RecurrenceId,
}

impl Column<(usize, &Occurrence)> for OccurrenceColumn {
    fn name(&self) -> &'static str {
        match self {
            Self::Index => "#",
            Self::Start => "START",
            Self::RecurrenceId => "RECURRENCE-ID",
        }
    }

    fn format(&self, (index, occurrence): &(usize, &Occurrence)) -> String {
        match self {
            Self::Index => (index + 1).to_string(),
            Self::Start => match occurrence.start.tzid() {
                Some(tzid) => format!("{} {tzid}", occurrence.start),
                None => occurrence.start.to_string(),
            },
            Self::RecurrenceId if occurrence.is_override => occurrence.recurrence_id.to_string(),
            Self::RecurrenceId => String::new(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            Self::Index => PaddingDirection::Right,
            Self::Start | Self::RecurrenceId => PaddingDirection::Left,
        }
    }

    fn color(&self, (_, occurrence): &(usize, &Occurrence)) -> Option<Color> {
        match self {
            Self::Start if occurrence.is_override => Some(Color::Yellow),
            _ => None,
        }
    }
}
