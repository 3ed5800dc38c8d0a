//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use vlmd_ingest::InputKind;

#[derive(Parser)]
#[command(
    name = "vlmd",
    version,
    about = "Convert data dictionaries into tabular and nested variable-level metadata",
    long_about = "Convert a data dictionary source (CSV or JSON template, SPSS .sav file, \
                  Stata .dta file, REDCap export) into tabular and nested data dictionaries.\n\n\
                  Both forms are validated and the validation errors are reported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert one input file into a data dictionary.
    Convert(ConvertArgs),

    /// List the registered input types.
    InputTypes,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Input file.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Data dictionary title (default: a JSON template's title, else the file name).
    #[arg(long)]
    pub title: Option<String>,

    /// Data dictionary description.
    #[arg(long)]
    pub description: Option<String>,

    /// Input type; inferred from the file suffix when omitted.
    #[arg(long = "input-type", value_enum, ignore_case = true, value_name = "TYPE")]
    pub input_type: Option<InputTypeArg>,

    /// Existing directory to write the dictionaries and error reports to.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// CLI input type choices, one per registered input kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputTypeArg {
    /// Tabular data dictionary template.
    Csv,
    /// JSON data dictionary template.
    Json,
    /// SPSS system file.
    Sav,
    /// Stata data file.
    Dta,
    /// REDCap data dictionary export.
    #[value(name = "redcap.csv")]
    RedcapCsv,
}

impl From<InputTypeArg> for InputKind {
    fn from(arg: InputTypeArg) -> Self {
        match arg {
            InputTypeArg::Csv => InputKind::CsvTemplate,
            InputTypeArg::Json => InputKind::JsonTemplate,
            InputTypeArg::Sav => InputKind::StatisticalFile,
            InputTypeArg::Dta => InputKind::StataFile,
            InputTypeArg::RedcapCsv => InputKind::RedcapCsv,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    fn parse_input_type(token: &str) -> Result<Option<InputTypeArg>, clap::Error> {
        let cli = Cli::try_parse_from(["vlmd", "convert", "in.txt", "--input-type", token])?;
        match cli.command {
            Command::Convert(args) => Ok(args.input_type),
            Command::InputTypes => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_registered_kind_is_a_choice() {
        for kind in InputKind::ALL {
            let arg = parse_input_type(kind.token()).unwrap();
            assert_eq!(arg.map(InputKind::from), Some(kind), "{kind}");
        }
        let choices = InputTypeArg::value_variants().len();
        assert_eq!(choices, InputKind::ALL.len());
    }

    #[test]
    fn input_type_ignores_case() {
        assert_eq!(parse_input_type("SAV").unwrap(), Some(InputTypeArg::Sav));
    }

    #[test]
    fn unknown_input_type_is_rejected_with_the_choices() {
        let err = parse_input_type("por").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        let message = err.to_string();
        assert!(message.contains("redcap.csv"), "{message}");
        assert!(message.contains("dta"), "{message}");
    }

    #[test]
    fn help_lists_the_input_types() {
        let help = Cli::command()
            .find_subcommand_mut("convert")
            .map(|convert| convert.render_long_help().to_string())
            .unwrap();
        for kind in InputKind::ALL {
            assert!(help.contains(kind.token()), "{kind}: {help}");
        }
    }
}
