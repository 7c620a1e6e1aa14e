// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use almanac_core::Config;
use clap::{ArgMatches, Command};
use colored::Colorize;

use crate::arg::CommonArgs;
use crate::io::read_calendar;

#[derive(Debug, Clone)]
pub struct CmdValidate {
    pub file: PathBuf,
}

impl CmdValidate {
    pub const NAME: &str = "validate";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("check")
            .about("Report parse problems and RFC 5545 violations")
            .arg(CommonArgs::file())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            file: CommonArgs::get_file(matches),
        }
    }

    pub async fn run(self, _config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "validating calendar...");
        let almanac = read_calendar(&self.file).await?;

        let diagnostics = almanac.diagnostics();
        let errors = almanac.validate();
        for diagnostic in diagnostics {
            println!("{} {diagnostic}", "warning:".yellow());
        }
        for error in &errors {
            println!("{} {error}", "error:".red());
        }

        if errors.is_empty() {
            println!(
                "{} {} ({} warning(s))",
                "ok:".green(),
                self.file.display(),
                diagnostics.len()
            );
            Ok(())
        } else {
            Err(format!("{} violation(s) in {}", errors.len(), self.file.display()).into())
        }
    }
}
