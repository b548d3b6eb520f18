use anyhow::{bail, Context, Result};
use clap::{crate_description, crate_version, ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use wormslookup::worms;

// -----------------------------------------------------------------------------
// command-line args
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    author,   // retrieved from Cargo.toml `authors`
    version,  // retrieved from Cargo.toml `version`
    about,    // retrieved from Cargo.toml `description`

    long_version = concat!(
        crate_version!(),
    ),

    long_about = concat!(
        crate_description!(),
    ),
)]
#[deny(missing_docs)]
/// Resolve taxonomic names against the World Register of Marine Species
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let mut s = Self::parse();

        // If `NO_COLOR` is set in the environment, disable colored output
        //
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            s.global_args.color = Mode::Never
        }

        s
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the names in one column of a table
    ///
    /// The distinct values of the name column are each looked up once in WoRMS.
    /// Every candidate match is written as one row of a results table, tagged with the looked-up name in its `PI_entered_name` column.
    /// A name whose lookup failed gets a single row with an `error_message` of either `HTTP error` or `Error fetching data`.
    ///
    /// Optionally, the accepted names and identifiers of the matches can be merged back onto the original table with `--merge`.
    /// Each original row then appears once per candidate match of its name, or once with empty match fields if there was none.
    #[command(display_order = 1)]
    Resolve(ResolveArgs),

    /// Look up names given on the command line
    #[command(display_order = 2, name = "match")]
    Match(MatchArgs),
}

// -----------------------------------------------------------------------------
// global options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output
    ///
    /// This can be repeated up to 2 times to enable successively more output.
    #[arg(global=true, long, short, action=ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(global=true, long, short, conflicts_with="verbose")]
    pub quiet: bool,

    /// Enable or disable colored output
    ///
    /// When this is "auto", colors are enabled when stderr is a tty.
    ///
    /// If the `NO_COLOR` environment variable is set, it takes precedence and is equivalent to `--color=never`.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub color: Mode,

    /// Enable or disable progress bars
    ///
    /// When this is "auto", progress bars are enabled when stderr is a tty.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub progress: Mode,
}

impl GlobalArgs {
    pub fn use_color(&self) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => atty::is(atty::Stream::Stderr),
        }
    }

    pub fn use_progress(&self) -> bool {
        match self.progress {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => atty::is(atty::Stream::Stderr),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    Auto,
    Never,
    Always,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Never => "never",
            Mode::Always => "always",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// registry client options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Registry Options")]
pub struct ClientArgs {
    /// Use the specified URL for the WoRMS REST API
    #[arg(long, value_name = "URL", default_value = worms::DEFAULT_BASE_URL, env("WORMSLOOKUP_API_URL"))]
    pub api_url: Url,

    /// Also match taxa that are not flagged as marine
    #[arg(long)]
    pub include_nonmarine: bool,

    /// The number of lookups to run concurrently
    #[arg(long("jobs"), short('j'), value_name="N", default_value_t=1)]
    pub num_jobs: usize,

    /// Wait at least this many milliseconds between starting successive lookups
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub request_interval: u64,

    /// Give up on a lookup after this many seconds
    ///
    /// By default no timeout is applied.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,
}

impl ClientArgs {
    pub fn build_client(&self) -> Result<worms::Client> {
        let timeout = match self.timeout {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(d) if !d.is_zero() => Some(d),
                _ => bail!("Invalid timeout: {secs}"),
            },
            None => None,
        };
        let client = worms::ClientBuilder::new()
            .base_url(self.api_url.clone())?
            .marine_only(!self.include_nonmarine)
            .timeout(timeout)
            .build()
            .context("Failed to initialize WoRMS client")?;
        Ok(client)
    }

    pub fn request_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.request_interval)).filter(|d| !d.is_zero())
    }
}

// -----------------------------------------------------------------------------
// `resolve` command
// -----------------------------------------------------------------------------
/// Arguments for the `resolve` command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to the input table
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Name of the column containing the scientific names
    ///
    /// If the column does not exist and stdin is a terminal, you will be asked for another name.
    #[arg(long, short, value_name = "NAME", default_value = "Prey_Taxa")]
    pub column: String,

    /// The single-byte field delimiter of the input and output tables
    #[arg(long, short, value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,

    #[command(flatten)]
    pub client_args: ClientArgs,

    #[command(flatten)]
    pub output_args: ResolveOutputArgs,
}

impl ResolveArgs {
    pub fn delimiter(&self) -> Result<u8> {
        match u8::try_from(self.delimiter) {
            Ok(b) if b.is_ascii() => Ok(b),
            _ => bail!("Delimiter must be a single ASCII character, not {:?}", self.delimiter),
        }
    }
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct ResolveOutputArgs {
    /// Write the results table to the specified path
    ///
    /// By default, the results table is written next to the input table, named `NAME_deduplicated_worms_taxa_results.csv`.
    #[arg(long, short, value_name = "PATH", conflicts_with = "output_name")]
    pub output: Option<PathBuf>,

    /// Base name of the results table written next to the input table
    ///
    /// Defaults to the file stem of the input table.
    #[arg(long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// Also merge the matches onto the input table, writing the result to the specified path
    #[arg(long, short, value_name = "PATH")]
    pub merge: Option<PathBuf>,

    /// Join on this column of the input table when merging
    ///
    /// Defaults to the name column.
    #[arg(long, value_name = "NAME", requires = "merge")]
    pub join_column: Option<String>,
}

/// Suffix of the default results table name.
const RESULTS_SUFFIX: &str = "_deduplicated_worms_taxa_results.csv";

impl ResolveOutputArgs {
    /// Where should the results table for the given input be written?
    pub fn results_path(&self, input: &std::path::Path) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let name = match &self.output_name {
            Some(name) => name.clone(),
            None => input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "wormslookup".to_owned()),
        };
        let dir = input.parent().unwrap_or_else(|| std::path::Path::new(""));
        dir.join(format!("{name}{RESULTS_SUFFIX}"))
    }
}

// -----------------------------------------------------------------------------
// `match` command
// -----------------------------------------------------------------------------
/// Arguments for the `match` command
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Scientific name to look up
    #[arg(value_name = "NAME", num_args(1..), required(true))]
    pub names: Vec<String>,

    #[command(flatten)]
    pub client_args: ClientArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// output options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    /// Write output to the specified path
    ///
    /// If this argument is not provided, stdout will be used.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write output in the specified format
    #[arg(long, short, value_name="FORMAT", default_value_t=OutputFormat::Human)]
    pub format: OutputFormat,
}

impl OutputArgs {
    /// Get a writer for the specified output destination.
    pub fn get_writer(&self) -> std::io::Result<Box<dyn std::io::Write>> {
        use std::fs::File;
        use std::io::BufWriter;

        match &self.output {
            None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
            Some(p) => {
                let f = File::create(p)?;
                Ok(Box::new(BufWriter::new(f)))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// output format
// -----------------------------------------------------------------------------
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// A text-based format designed for humans
    Human,

    /// Pretty-printed JSON format
    Json,

    /// JSON Lines format
    ///
    /// This is a sequence of JSON objects, one per line.
    Jsonl,

    /// Comma-separated values, in the same layout as the `resolve` results table
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
        };
        write!(f, "{s}")
    }
}
