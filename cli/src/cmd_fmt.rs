// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use almanac_core::Config;
use clap::{ArgMatches, Command, arg};

use crate::arg::CommonArgs;
use crate::io::{read_calendar, write_calendar};

#[derive(Debug, Clone)]
pub struct CmdFmt {
    pub file: PathBuf,
    pub in_place: bool,
}

impl CmdFmt {
    pub const NAME: &str = "fmt";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Rewrite a calendar with CRLF line endings and folded lines")
            .arg(CommonArgs::file())
            .arg(arg!(-i --"in-place" "Write the result back to the file instead of stdout"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            file: CommonArgs::get_file(matches),
            in_place: matches.get_flag("in-place"),
        }
    }

    pub async fn run(self, _config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "formatting calendar...");
        let almanac = read_calendar(&self.file).await?;
        if self.in_place {
            write_calendar(&self.file, &almanac).await
        } else {
            print!("{}", almanac.serialize()?);
            Ok(())
        }
    }
}
