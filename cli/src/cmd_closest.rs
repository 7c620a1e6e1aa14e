// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use almanac_core::{Config, OutputFormat};
use clap::{ArgMatches, Command, arg};

use crate::arg::{CommonArgs, parse_datetime};
use crate::io::read_calendar;
use crate::occurrence_formatter::OccurrenceFormatter;

#[derive(Debug, Clone)]
pub struct CmdClosest {
    pub file: PathBuf,
    pub uid: String,
    pub at: String,
    pub tzid: Option<String>,
    pub output_format: Option<OutputFormat>,
}

impl CmdClosest {
    pub const NAME: &str = "closest";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the latest occurrence starting at or before a time")
            .arg(CommonArgs::file())
            .arg(CommonArgs::uid(true))
            .arg(arg!(--at <DATETIME> "Time to look back from").required(true))
            .arg(CommonArgs::tzid())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            file: CommonArgs::get_file(matches),
            uid: CommonArgs::get_uid(matches).unwrap_or_default(),
            at: matches.get_one::<String>("at").cloned().unwrap_or_default(),
            tzid: CommonArgs::get_tzid(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "looking up closest occurrence...");
        let almanac = read_calendar(&self.file).await?;
        let target = parse_datetime(&self.at, self.tzid.as_deref())?;

        let Some(occurrence) = almanac.closest_occurrence_on_or_before(&self.uid, &target)? else {
            return Err(format!("{} has no occurrence at or before {}", self.uid, self.at).into());
        };
        let format = self.output_format.unwrap_or(config.output_format);
        print!(
            "{}",
            OccurrenceFormatter::new(&self.uid, format).format(&[occurrence])
        );
        Ok(())
    }
}
