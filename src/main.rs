use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use socialplot::data::CoercionMode;
use socialplot::{runtime, OutputFormat, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "socialplot")]
#[command(about = "Render social media engagement charts from CSV", long_about = None)]
struct Cli {
    /// JSON file with render options (format, theme, date window)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on the first malformed row instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Engagement CSV (Platform, PostType, Date, Likes); `-` reads stdin
    #[arg(long, default_value = "socialMedia.csv")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format, overriding the config file
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Distribution of likes per platform
    Boxplot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Average likes per platform and post type
    Barplot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Average likes per day over the configured window
    Lineplot {
        #[command(flatten)]
        input: InputArgs,
        /// Read daily averages from a Date,AvgLikes file instead of --input
        #[arg(long)]
        summary: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write daily averages as a Date,AvgLikes CSV
    Daily {
        #[command(flatten)]
        input: InputArgs,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render every chart and the daily summary into a directory
    All {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
}

fn init_logging() {
    let stderr_layer = fmt::layer()
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry().with(stderr_layer).init();
}

fn load_options(config: Option<&Path>, format: Option<OutputFormat>) -> Result<RenderOptions> {
    let mut options = match config {
        Some(path) => RenderOptions::from_json_file(path)?,
        None => RenderOptions::default(),
    };
    if let Some(format) = format {
        options.format = format;
    }
    Ok(options)
}

/// Write bytes to `path`, or to stdout when no path is given
fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "Wrote output");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mode = if cli.strict { CoercionMode::Strict } else { CoercionMode::Lenient };
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Boxplot { input, output } => {
            let options = load_options(config, output.format)?;
            let records = runtime::load_records(&input.input, mode)?;
            let bytes = runtime::render_boxplot(&records, &options)?;
            write_output(output.output.as_deref(), &bytes)?;
        }
        Commands::Barplot { input, output } => {
            let options = load_options(config, output.format)?;
            let records = runtime::load_records(&input.input, mode)?;
            let bytes = runtime::render_barplot(&records, &options)?;
            write_output(output.output.as_deref(), &bytes)?;
        }
        Commands::Lineplot { input, summary, output } => {
            let options = load_options(config, output.format)?;
            let daily = match summary {
                Some(path) => runtime::load_daily_summary(&path, mode)?,
                None => socialplot::transform::compute_daily_averages(&runtime::load_records(&input.input, mode)?),
            };
            let bytes = runtime::render_lineplot(&daily, &options)?;
            write_output(output.output.as_deref(), &bytes)?;
        }
        Commands::Daily { input, output } => {
            let records = runtime::load_records(&input.input, mode)?;
            let mut buf = Vec::new();
            runtime::export_daily_summary(&records, &mut buf)?;
            write_output(output.as_deref(), &buf)?;
        }
        Commands::All { input, out_dir, format } => {
            let options = load_options(config, format)?;
            let records = runtime::load_records(&input.input, mode)?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create '{}'", out_dir.display()))?;

            let ext = options.format.extension();
            let daily = socialplot::transform::compute_daily_averages(&records);
            let charts = [
                ("boxplot", runtime::render_boxplot(&records, &options)?),
                ("barplot", runtime::render_barplot(&records, &options)?),
                ("lineplot", runtime::render_lineplot(&daily, &options)?),
            ];
            for (name, bytes) in charts {
                let path = out_dir.join(format!("{}.{}", name, ext));
                write_output(Some(&path), &bytes)?;
            }

            let summary_path = out_dir.join("socialMediaTime.csv");
            let file = File::create(&summary_path)
                .with_context(|| format!("Failed to create '{}'", summary_path.display()))?;
            runtime::export_daily_summary(&records, file)?;
            info!(path = %summary_path.display(), "Wrote daily summary");
        }
    }

    Ok(())
}
