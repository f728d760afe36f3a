//! CLI command definitions, routing, and tracing setup.

use std::env::VarError;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use webscratch_core::gate::{MANUAL_INSTRUCTIONS, missing_notice};
use webscratch_core::pipeline::{BuildConfig, BuildOutcome, ProgressReporter, run_build};
use webscratch_core::recode::{NewlineMode, recode_file};
use webscratch_shared::{BuildLayout, ProjectConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// webscratch — build Scratch 1.4 into JavaScript.
#[derive(Parser)]
#[command(
    name = "webscratch",
    version,
    about = "Unpack the Scratch 1.4 sources, recode them to UTF-8 and compile them with a JS shell.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root holding `original-sources/` and `js/`.
    #[arg(long, default_value = ".", global = true)]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the whole build: unzip, recode, self-test, compile.
    Build {
        /// Engine command line (program plus flags). Overrides the env var.
        #[arg(long)]
        js: Option<String>,

        /// Reuse build/sources if it already exists instead of unzipping again.
        #[arg(long)]
        skip_extract: bool,

        /// Turn CR and CRLF line endings into LF while recoding.
        #[arg(long)]
        unix_newlines: bool,
    },

    /// Recode an 8-bit file to UTF-8, byte for code point.
    #[command(override_usage = "webscratch recode RAWFILE FILE.utf8")]
    Recode {
        /// 8-bit input file.
        #[arg(value_name = "RAWFILE")]
        source: PathBuf,

        /// UTF-8 output file (overwritten).
        #[arg(value_name = "FILE.utf8")]
        dest: PathBuf,

        /// Turn CR and CRLF line endings into LF.
        #[arg(long)]
        unix_newlines: bool,
    },

    /// Project configuration (webscratch.toml).
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write webscratch.toml with defaults into the project root.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "webscratch=info",
        1 => "webscratch=debug",
        _ => "webscratch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            js,
            skip_extract,
            unix_newlines,
        } => cmd_build(&cli.root, js.as_deref(), skip_extract, unix_newlines).await,
        Command::Recode {
            source,
            dest,
            unix_newlines,
        } => cmd_recode(&source, &dest, unix_newlines).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cli.root).await,
            ConfigAction::Show => cmd_config_show(&cli.root).await,
        },
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(root)
        .map_err(|e| eyre!("project root '{}' is not accessible: {e}", root.display()))
}

async fn cmd_build(
    root: &Path,
    js: Option<&str>,
    skip_extract: bool,
    unix_newlines: bool,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mut project: ProjectConfig = load_config(&root)?;
    if unix_newlines {
        project.recode.unix_newlines = true;
    }

    let env_var = project.engine.env_var.clone();
    let engine_line = engine_value(js, std::env::var(&env_var), &env_var)?;

    let mut config = BuildConfig::new(BuildLayout::new(&root), &project, engine_line.as_deref());
    config.skip_extract = skip_extract;

    info!(
        root = %root.display(),
        archives = config.archives.len(),
        engine = config.engine.as_ref().map(ToString::to_string).unwrap_or_default(),
        "starting build"
    );

    let reporter = CliProgress::new();
    let outcome = run_build(&config, &reporter).await;
    reporter.clear();

    print!("{}", render_outcome(&outcome?, &config.layout));

    Ok(())
}

/// Pick the engine command line: `--js` beats the environment.
///
/// A blank value counts as unset later on; a value that is set but not
/// Unicode is an error rather than "not set".
fn engine_value(
    js: Option<&str>,
    from_env: std::result::Result<String, VarError>,
    env_var: &str,
) -> Result<Option<String>> {
    if let Some(value) = js {
        return Ok(Some(value.to_string()));
    }
    match from_env {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(eyre!(
            "{env_var} is set but is not valid Unicode: {}",
            raw.to_string_lossy()
        )),
    }
}

/// Operator-facing text for how the build ended.
fn render_outcome(outcome: &BuildOutcome, layout: &BuildLayout) -> String {
    let mut out = String::new();
    match outcome {
        BuildOutcome::Compiled {
            output,
            extracted,
            recoded,
            elapsed,
        } => {
            out.push('\n');
            out.push_str("  Build finished!\n");
            if let Some(summary) = extracted {
                out.push_str(&format!(
                    "  Unzipped: {} files from {} archives\n",
                    summary.files_written,
                    summary.archives.len()
                ));
            }
            out.push_str(&format!(
                "  Recoded:  {} → {} bytes\n",
                recoded.bytes_read, recoded.bytes_written
            ));
            out.push_str(&format!("  Output:   {}\n", output.display()));
            out.push_str(&format!("  Time:     {:.1}s\n", elapsed.as_secs_f64()));
            out.push('\n');
        }
        BuildOutcome::AwaitingManualStep { .. } => {
            out.push_str(&missing_notice(layout));
            out.push_str("\n\n");
            out.push_str(MANUAL_INSTRUCTIONS);
        }
        BuildOutcome::EngineNotConfigured { env_var } => {
            out.push_str(&format!("{env_var} environment variable not set.\n"));
            out.push_str("The build requires Mozilla's JS shell to be installed.\n");
            out.push_str(&format!(
                "export {env_var}='full/path/to/js -m -n' and try again!\n"
            ));
        }
    }
    out
}

async fn cmd_recode(source: &Path, dest: &Path, unix_newlines: bool) -> Result<()> {
    let mode = if unix_newlines {
        NewlineMode::Unix
    } else {
        NewlineMode::Preserve
    };
    let stats = recode_file(source, dest, mode).await?;
    info!(
        read = stats.bytes_read,
        written = stats.bytes_written,
        "recode finished"
    );
    Ok(())
}

async fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(&resolve_root(root)?)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(root: &Path) -> Result<()> {
    let config: ProjectConfig = load_config(&resolve_root(root)?)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
///
/// The spinner only redraws on stage changes: the engine stages share the
/// terminal with the JS shell's own output.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
        self.spinner.tick();
    }

    fn archive_started(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Unzipping [{current}/{total}] {name}"));
        self.spinner.tick();
    }

    fn done(&self, _outcome: &BuildOutcome) {
        self.spinner.finish_and_clear();
    }
}
