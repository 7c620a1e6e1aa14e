// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use almanac_core::{APP_NAME, Config};
use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::LocalBoxFuture};
use tracing_subscriber::EnvFilter;

use crate::cmd_apply::CmdApply;
use crate::cmd_closest::CmdClosest;
use crate::cmd_expand::CmdExpand;
use crate::cmd_fmt::CmdFmt;
use crate::cmd_validate::CmdValidate;
use crate::config::parse_config;

/// Run the almanac command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
    Ok(())
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Expand recurring iCalendar components and apply iTIP messages.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $ALMANAC_CONFIG, then to \
$XDG_CONFIG_HOME/almanac/config.toml on Linux and MacOS, %LOCALAPPDATA%/almanac/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(CmdExpand::command())
            .subcommand(CmdClosest::command())
            .subcommand(CmdApply::command())
            .subcommand(CmdValidate::command())
            .subcommand(CmdFmt::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(&matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::{Apply, Closest, Expand, Fmt, Validate};
        let command = match matches.subcommand() {
            Some((CmdExpand::NAME, matches)) => Expand(CmdExpand::from(matches)),
            Some((CmdClosest::NAME, matches)) => Closest(CmdClosest::from(matches)),
            Some((CmdApply::NAME, matches)) => Apply(CmdApply::from(matches)),
            Some((CmdValidate::NAME, matches)) => Validate(CmdValidate::from(matches)),
            Some((CmdFmt::NAME, matches)) => Fmt(CmdFmt::from(matches)),
            _ => return Err("Unknown command".into()),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// List occurrences
    Expand(CmdExpand),

    /// Show the closest earlier occurrence
    Closest(CmdClosest),

    /// Apply an iTIP message
    Apply(CmdApply),

    /// Validate a calendar
    Validate(CmdValidate),

    /// Reformat a calendar
    Fmt(CmdFmt),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::{Apply, Closest, Expand, Fmt, Validate};
        match self {
            Expand(a)   => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            Closest(a)  => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            Apply(a)    => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            Validate(a) => Self::run_with(config, |x| a.run(x).boxed_local()).await,
            Fmt(a)      => Self::run_with(config, |x| a.run(x).boxed_local()).await,
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a Config) -> LocalBoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        f(&config).await
    }
}

#[cfg(test)]
mod tests {
    use almanac_core::OutputFormat;

    use super::*;

    #[test]
    fn test_parse_config() {
        let args = ["test", "-c", "/tmp/config.toml", "validate", "cal.ics"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_parse_requires_a_command() {
        assert!(Cli::try_parse_from(["test"]).is_err());
    }

    #[test]
    fn test_parse_expand() {
        let args = [
            "test",
            "expand",
            "cal.ics",
            "--uid",
            "u1",
            "--from",
            "2024-01-01",
            "-n",
            "5",
            "--output-format",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Expand(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("cal.ics"));
                assert_eq!(cmd.uid.as_deref(), Some("u1"));
                assert_eq!(cmd.from.as_deref(), Some("2024-01-01"));
                assert_eq!(cmd.limit, Some(5));
                assert_eq!(cmd.output_format, Some(OutputFormat::Json));
            }
            _ => panic!("Expected Expand command"),
        }
    }

    #[test]
    fn test_parse_expand_defaults() {
        let cli = Cli::try_parse_from(["test", "expand", "cal.ics"]).unwrap();
        match cli.command {
            Commands::Expand(cmd) => {
                assert_eq!(cmd.uid, None);
                assert_eq!(cmd.limit, None);
                assert_eq!(cmd.output_format, None);
            }
            _ => panic!("Expected Expand command"),
        }
    }

    #[test]
    fn test_parse_closest() {
        let args = ["test", "closest", "cal.ics", "--uid", "u1", "--at", "20240105T000000Z"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Closest(cmd) => {
                assert_eq!(cmd.uid, "u1");
                assert_eq!(cmd.at, "20240105T000000Z");
            }
            _ => panic!("Expected Closest command"),
        }
    }

    #[test]
    fn test_parse_closest_requires_uid() {
        let args = ["test", "closest", "cal.ics", "--at", "20240105"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_apply() {
        let args = ["test", "apply", "msg.ics", "--calendar", "cal.ics", "--dry-run"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Apply(cmd) => {
                assert_eq!(cmd.message, PathBuf::from("msg.ics"));
                assert_eq!(cmd.calendar, Some(PathBuf::from("cal.ics")));
                assert!(cmd.dry_run);
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_parse_validate_alias() {
        let cli = Cli::try_parse_from(["test", "check", "cal.ics"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_parse_fmt() {
        let cli = Cli::try_parse_from(["test", "fmt", "-i", "cal.ics"]).unwrap();
        match cli.command {
            Commands::Fmt(cmd) => assert!(cmd.in_place),
            _ => panic!("Expected Fmt command"),
        }
    }
}
