// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use almanac_core::{Config, ItipLog};
use clap::{ArgMatches, Command, ValueHint, arg, value_parser};
use colored::Colorize;
use tokio::fs;

use crate::io::{read_calendar, write_calendar};

#[derive(Debug, Clone)]
pub struct CmdApply {
    pub message: PathBuf,
    pub calendar: Option<PathBuf>,
    pub dry_run: bool,
}

impl CmdApply {
    pub const NAME: &str = "apply";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Apply an iTIP message (PUBLISH, REQUEST or CANCEL) to a calendar")
            .arg(
                arg!(<MESSAGE> "Path to the iTIP message")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(
                arg!(--calendar <FILE> "Calendar to update, defaults to the configured one")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(arg!(--"dry-run" "Show what would change without writing the calendar"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            message: matches
                .get_one::<PathBuf>("MESSAGE")
                .cloned()
                .unwrap_or_default(),
            calendar: matches.get_one::<PathBuf>("calendar").cloned(),
            dry_run: matches.get_flag("dry-run"),
        }
    }

    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "applying iTIP message...");
        let Some(calendar_path) = self.calendar.or_else(|| config.calendar_path.clone()) else {
            return Err("No calendar given, use --calendar or set calendar_path in the config".into());
        };

        let mut almanac = read_calendar(&calendar_path).await?;
        let message = fs::read_to_string(&self.message).await.map_err(|e| {
            format!("Failed to read message at {}: {e}", self.message.display())
        })?;

        let log = almanac.process_itip(&message)?;
        for entry in &log {
            print_log(entry);
        }

        if self.dry_run {
            println!("{} calendar not written", "Dry run:".yellow());
        } else {
            write_calendar(&calendar_path, &almanac).await?;
        }
        Ok(())
    }
}

fn print_log(entry: &ItipLog) {
    match entry {
        ItipLog::Success(message) => println!("{} {message}", "SUCCESS:".green()),
        ItipLog::Warning(message) => println!("{} {message}", "WARNING:".yellow()),
    }
}
