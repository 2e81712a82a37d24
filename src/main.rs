//! sheet2json - Spreadsheet to JSON conversion

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use sheet2json::config::{
    Config, ConvertConfig, DateFormat, FilterConfig, JoinConfig, SearchConfig,
};
use sheet2json::logging::init_logging;
use sheet2json::pipeline::{
    run_convert, run_detail, run_filter, run_join, run_rac_group, run_search,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDateFormat {
    Iso,
    Epoch,
}

impl From<CliDateFormat> for DateFormat {
    fn from(f: CliDateFormat) -> Self {
        match f {
            CliDateFormat::Iso => DateFormat::Iso,
            CliDateFormat::Epoch => DateFormat::Epoch,
        }
    }
}

/// Convert spreadsheets to JSON record arrays.
///
/// With no command, runs `convert` and then `join` on the default files.
#[derive(Parser, Debug)]
#[command(name = "sheet2json")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// For Excel files: which sheet to read (default: first sheet)
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// How dates are written to JSON
    #[arg(long, value_enum, default_value = "iso", global = true)]
    date_format: CliDateFormat,

    /// More log output (repeat for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Parse `KIND=PATH`, e.g. `FRAC=frac_code_table.json`
fn parse_rac_table(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((kind, path)) if !kind.is_empty() && !path.is_empty() => {
            Ok((kind.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected KIND=PATH, got '{}'", s)),
    }
}

/// Inputs shared by the lookups that consult the RAC code tables
#[derive(Args, Debug)]
struct LookupArgs {
    /// Joined records (default: pesticides.json)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// RAC code table as KIND=PATH (repeatable; default: FRAC, IRAC, HRAC JSON files)
    #[arg(long = "rac-table", value_name = "KIND=PATH", value_parser = parse_rac_table)]
    rac_tables: Vec<(String, PathBuf)>,

    /// Write pretty-printed JSON
    #[arg(long)]
    pretty: bool,
}

impl LookupArgs {
    fn into_job(self) -> SearchConfig {
        let mut job = SearchConfig::default().with_pretty(self.pretty);
        if let Some(input) = self.input {
            job = job.with_input(input);
        }
        if !self.rac_tables.is_empty() {
            job = job.with_rac_tables(self.rac_tables);
        }
        job
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert each input table to <stem>.json (pretty-printed)
    Convert {
        /// Input files (default: frac/hrac/irac code tables)
        inputs: Vec<PathBuf>,

        /// Directory for output files (default: next to each input)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },
    /// Stack the applicable tables and left-join them onto the basic table
    Join {
        /// Basic (left) table
        #[arg(long)]
        basic: Option<PathBuf>,

        /// Applicable tables, stacked in order (repeatable)
        #[arg(long)]
        applicable: Vec<PathBuf>,

        /// Join key column
        #[arg(short, long)]
        key: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Keep records whose column contains a text
    Filter {
        /// Input table
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column to search
        #[arg(long)]
        column: Option<String>,

        /// Text the column must contain
        #[arg(long)]
        contains: Option<String>,

        /// Write pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print records whose name, maker or kind contains every keyword
    Search {
        /// Keywords (all must match; none lists every registration)
        keywords: Vec<String>,

        /// Joined records (default: pesticides.json)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print all application rows of one registration with its RAC groups
    Detail {
        /// Registration number (登録番号)
        registration: String,

        #[command(flatten)]
        lookup: LookupArgs,
    },
    /// Print registrations whose ingredients belong to one RAC group
    RacGroup {
        /// FRAC, IRAC or HRAC
        #[arg(long = "type")]
        rac_type: String,

        /// Group code, e.g. M5 or 1B
        #[arg(long)]
        code: String,

        #[command(flatten)]
        lookup: LookupArgs,
    },
    /// Run convert and join with default files
    All,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet { -1 } else { cli.verbose.min(i8::MAX as u8) as i8 };
    init_logging(verbosity);

    let mut config = Config::default().with_date_format(cli.date_format.into());
    if let Some(sheet) = cli.sheet {
        config = config.with_sheet_name(sheet);
    }

    match cli.command.unwrap_or(Command::All) {
        Command::Convert {
            inputs,
            output_dir,
            compact,
        } => {
            let mut job = ConvertConfig::default().with_pretty(!compact);
            if !inputs.is_empty() {
                job = job.with_inputs(inputs);
            }
            if let Some(dir) = output_dir {
                job = job.with_output_dir(dir);
            }
            run_convert(&job, &config).context("Failed to run convert pipeline")?;
        }
        Command::Join {
            basic,
            applicable,
            key,
            output,
            pretty,
        } => {
            let mut job = JoinConfig::default().with_pretty(pretty);
            if let Some(basic) = basic {
                job = job.with_basic(basic);
            }
            if !applicable.is_empty() {
                job = job.with_applicable(applicable);
            }
            if let Some(key) = key {
                job = job.with_key(key);
            }
            if let Some(output) = output {
                job = job.with_output(output);
            }
            run_join(&job, &config).context("Failed to run join pipeline")?;
        }
        Command::Filter {
            input,
            output,
            column,
            contains,
            pretty,
        } => {
            let mut job = FilterConfig::default().with_pretty(pretty);
            if let Some(input) = input {
                job = job.with_input(input);
            }
            if let Some(output) = output {
                job = job.with_output(output);
            }
            if let Some(column) = column {
                job = job.with_column(column);
            }
            if let Some(needle) = contains {
                job = job.with_needle(needle);
            }
            run_filter(&job, &config).context("Failed to run filter pipeline")?;
        }
        Command::Search {
            keywords,
            input,
            pretty,
        } => {
            let mut job = SearchConfig::default().with_pretty(pretty);
            if let Some(input) = input {
                job = job.with_input(input);
            }
            run_search(&job, &keywords.join(" "), &config, &mut std::io::stdout().lock())
                .context("Failed to run search")?;
        }
        Command::Detail {
            registration,
            lookup,
        } => {
            run_detail(
                &lookup.into_job(),
                &registration,
                &config,
                &mut std::io::stdout().lock(),
            )
            .context("Failed to run detail lookup")?;
        }
        Command::RacGroup {
            rac_type,
            code,
            lookup,
        } => {
            run_rac_group(
                &lookup.into_job(),
                &rac_type,
                &code,
                &config,
                &mut std::io::stdout().lock(),
            )
            .context("Failed to run RAC group lookup")?;
        }
        Command::All => {
            run_convert(&ConvertConfig::default(), &config)
                .context("Failed to run convert pipeline")?;
            run_join(&JoinConfig::default(), &config).context("Failed to run join pipeline")?;
        }
    }

    Ok(())
}
