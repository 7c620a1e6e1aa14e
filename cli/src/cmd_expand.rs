// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use almanac_core::{Almanac, Config, Occurrence, OutputFormat};
use clap::{ArgMatches, Command, arg, value_parser};
use colored::Colorize;

use crate::arg::{CommonArgs, parse_datetime};
use crate::io::read_calendar;
use crate::occurrence_formatter::OccurrenceFormatter;

#[derive(Debug, Clone)]
pub struct CmdExpand {
    pub file: PathBuf,
    pub uid: Option<String>,
    pub from: Option<String>,
    pub tzid: Option<String>,
    pub limit: Option<usize>,
    pub output_format: Option<OutputFormat>,
}

impl CmdExpand {
    pub const NAME: &str = "expand";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the occurrences of recurring components")
            .arg(CommonArgs::file())
            .arg(CommonArgs::uid(false).long_help(
                "UID of the component to expand. Every component with a start is expanded when omitted.",
            ))
            .arg(arg!(--from <DATETIME> "List occurrences starting at or after this time"))
            .arg(CommonArgs::tzid())
            .arg(
                arg!(-n --limit <N> "Maximum number of occurrences per component")
                    .value_parser(value_parser!(usize)),
            )
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            file: CommonArgs::get_file(matches),
            uid: CommonArgs::get_uid(matches),
            from: matches.get_one::<String>("from").cloned(),
            tzid: CommonArgs::get_tzid(matches),
            limit: matches.get_one::<usize>("limit").copied(),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "expanding occurrences...");
        let almanac = read_calendar(&self.file).await?;
        let from = self
            .from
            .as_deref()
            .map(|text| parse_datetime(text, self.tzid.as_deref()))
            .transpose()?;
        let limit = self.limit.unwrap_or(config.occurrence_limit);
        let format = self.output_format.unwrap_or(config.output_format);

        let uids = match self.uid {
            Some(uid) => vec![uid],
            None => expandable_uids(&almanac),
        };
        for (i, uid) in uids.iter().enumerate() {
            let occurrences: Vec<Occurrence> = almanac
                .stream_occurrences(uid, from.as_ref())?
                .take(limit)
                .collect();

            if format == OutputFormat::Table {
                if i > 0 {
                    println!();
                }
                println!("{}", uid.bold());
            }
            print!("{}", OccurrenceFormatter::new(uid, format).format(&occurrences));
        }
        Ok(())
    }
}

/// UIDs of the displayable series with a start, in calendar order.
fn expandable_uids(almanac: &Almanac) -> Vec<String> {
    let mut uids: Vec<String> = Vec::new();
    for component in almanac.calendar().components() {
        if !component.is_displayable() || component.is_override() {
            continue;
        }
        if let Some(uid) = component.uid()
            && matches!(component.dtstart(), Ok(Some(_)))
            && !uids.iter().any(|u| u == uid)
        {
            uids.push(uid.to_string());
        }
    }
    uids
}
