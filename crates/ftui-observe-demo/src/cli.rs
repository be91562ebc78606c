#![forbid(unsafe_code)]

//! Command-line argument parsing for the observe demo.
//!
//! Parses args manually (no external dependencies). Flags override the
//! `FTUI_OBSERVE_*` environment read by `ObserverConfig::from_env`.

use std::fmt;

use ftui_observe::{NotifyTiming, ObserverConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
ftui-observe demo: scripted writes against an observed data graph

USAGE:
    ftui-observe-demo [OPTIONS]

OPTIONS:
    --notify-after       Notify array sinks after the mutation (default: before)
    --convert-inserted   Make structures inserted into arrays reactive
    --json               Print the final snapshot as JSON on stdout
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    FTUI_OBSERVE_NOTIFY            'before' or 'after'
    FTUI_OBSERVE_CONVERT_INSERTED  1/true/yes/on to convert inserted elements
    RUST_LOG                       Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Observer configuration after env and flag overrides.
    pub config: ObserverConfig,
    /// Print the final snapshot as JSON.
    pub json: bool,
}

/// Outcome of argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Help,
    Version,
    UnknownArg(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str(HELP_TEXT),
            Self::Version => write!(f, "ftui-observe-demo {VERSION}"),
            Self::UnknownArg(arg) => write!(f, "unknown argument: {arg}\n\n{HELP_TEXT}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Opts {
    /// Parse arguments (without the program name) on top of `base`.
    pub fn parse_from<I, S>(args: I, base: ObserverConfig) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self {
            config: base,
            json: false,
        };
        for arg in args {
            match arg.as_ref() {
                "--notify-after" => {
                    opts.config = opts
                        .config
                        .with_sequence_notify(NotifyTiming::AfterMutation);
                }
                "--convert-inserted" => {
                    opts.config = opts.config.with_convert_inserted(true);
                }
                "--json" => opts.json = true,
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                other => return Err(ParseError::UnknownArg(other.to_string())),
            }
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opts, ParseError> {
        Opts::parse_from(args.iter().copied(), ObserverConfig::default())
    }

    #[test]
    fn defaults() {
        let opts = parse(&[]).expect("parse");
        assert_eq!(opts.config, ObserverConfig::default());
        assert!(!opts.json);
    }

    #[test]
    fn flags() {
        let opts = parse(&["--notify-after", "--convert-inserted", "--json"]).expect("parse");
        assert_eq!(opts.config.sequence_notify, NotifyTiming::AfterMutation);
        assert!(opts.config.convert_inserted);
        assert!(opts.json);
    }

    #[test]
    fn flags_override_base() {
        let base = ObserverConfig::default().with_convert_inserted(false);
        let opts = Opts::parse_from(["--convert-inserted"], base).expect("parse");
        assert!(opts.config.convert_inserted);
    }

    #[test]
    fn help_version_unknown() {
        assert_eq!(parse(&["-h"]), Err(ParseError::Help));
        assert_eq!(parse(&["--version"]), Err(ParseError::Version));
        assert_eq!(
            parse(&["--nope"]),
            Err(ParseError::UnknownArg("--nope".to_string()))
        );
        assert!(ParseError::Version.to_string().contains(VERSION));
    }
}
