use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfdiffConfig;
use crate::diff::DiffFormat;

#[derive(Parser, Debug)]
#[command(name = "confdiff")]
#[command(version)]
#[command(about = "Line-oriented diffs for configuration files and deploy snapshots")]
#[command(long_about = "confdiff compares two text files line by line using Myers' shortest edit script and prints a compact preview with +/- markers. With --json both sides are normalised as JSON snapshots first; with --plan they are treated as a deployed application and its desired configuration.")]
pub struct Cli {
    /// File holding the old content
    #[arg(value_name = "BEFORE")]
    pub before: PathBuf,

    /// File holding the new content
    #[arg(value_name = "AFTER")]
    pub after: PathBuf,

    /// Diff context lines
    #[arg(short = 'C', long, help = "Number of unchanged lines shown around each change")]
    pub context: Option<usize>,

    /// Normalise both sides as JSON snapshots before diffing
    #[arg(long, help = "Treat inputs as JSON and diff normalised snapshots")]
    pub json: bool,

    /// Plan a deploy from a deployed application and its desired config
    #[arg(
        long,
        conflicts_with = "json",
        help = "Plan a deploy (an empty BEFORE means nothing is deployed)"
    )]
    pub plan: bool,

    /// Output format
    #[arg(short, long, default_value = "text", help = "Output format")]
    pub format: DiffFormat,

    /// Disable colors in output
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    /// Configuration file
    #[arg(long, value_name = "FILE", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Also write the preview to a file
    #[arg(short, long, value_name = "FILE", help = "Write the preview to a file")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Exit with status 1 when the inputs differ
    #[arg(long, help = "Exit with 1 if there were differences")]
    pub exit_code: bool,
}

impl Cli {
    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }

    pub fn validate(&self) -> Result<(), String> {
        for path in [&self.before, &self.after] {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }

            if !path.is_file() {
                return Err(format!("Path is not a file: {}", path.display()));
            }
        }

        if let Some(config) = &self.config {
            if !config.is_file() {
                return Err(format!("Config file not found: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Merge command line flags over the loaded configuration
    pub fn apply_to(&self, config: &mut ConfdiffConfig) {
        if let Some(context) = self.context {
            config.diff.context_lines = context;
        }
        if self.no_color {
            config.output.color = false;
        }
    }
}
