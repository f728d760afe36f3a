//! End-to-end build: extract → manual gate → recode → self-test → compile.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use webscratch_shared::{BuildLayout, ProjectConfig, Result};

use crate::archive::{self, ExtractSummary};
use crate::engine::{self, EngineCommand};
use crate::gate::{self, GateStatus};
use crate::recode::{self, NewlineMode, RecodeStats};

/// Everything one build needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project paths.
    pub layout: BuildLayout,
    /// Archive names under `original-sources/`, in extraction order.
    pub archives: Vec<String>,
    /// Engine command line; `None` when the env var is unset or blank.
    pub engine: Option<EngineCommand>,
    /// Env var the engine was expected in, for the guidance message.
    pub engine_env_var: String,
    /// Self-test script run from `js/tests`.
    pub self_test: String,
    /// Compiler script run from `js`.
    pub compiler: String,
    /// Line-ending handling for the recoded source.
    pub newlines: NewlineMode,
    /// Reuse an existing `build/sources` instead of unzipping again.
    pub skip_extract: bool,
}

impl BuildConfig {
    /// Merge the project config with the engine value read from the environment.
    pub fn new(layout: BuildLayout, project: &ProjectConfig, engine_value: Option<&str>) -> Self {
        Self {
            layout,
            archives: project.archives.names.clone(),
            engine: engine_value.and_then(EngineCommand::parse),
            engine_env_var: project.engine.env_var.clone(),
            self_test: project.engine.self_test.clone(),
            compiler: project.engine.compiler.clone(),
            newlines: if project.recode.unix_newlines {
                NewlineMode::Unix
            } else {
                NewlineMode::Preserve
            },
            skip_extract: false,
        }
    }
}

/// How a build ended. Only the first variant produced compiled output;
/// the other two are deliberate pauses, not failures.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The compiler ran to completion.
    Compiled {
        output: PathBuf,
        extracted: Option<ExtractSummary>,
        recoded: RecodeStats,
        elapsed: Duration,
    },
    /// The hand-made Smalltalk dump does not exist yet.
    AwaitingManualStep { expected: PathBuf },
    /// No engine command was configured.
    EngineNotConfigured { env_var: String },
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called before each archive is unpacked.
    fn archive_started(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline stops, for whatever reason other than an error.
    fn done(&self, outcome: &BuildOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn archive_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &BuildOutcome) {}
}

/// Run the full build.
///
/// 1. Unzip vendor archives into `build/sources`
/// 2. Stop if the manual Squeak file-out is missing
/// 3. Recode the file-out to UTF-8
/// 4. Stop if no engine is configured
/// 5. Run the engine self-test
/// 6. Compile, capturing stdout into `build/ScratchSources.js`
#[instrument(skip_all, fields(root = %config.layout.root.display()))]
pub async fn run_build(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildOutcome> {
    let start = Instant::now();
    let layout = &config.layout;

    // --- Stage 1: Extract ---
    let extracted = if config.skip_extract && layout.sources_dir.is_dir() {
        info!(path = %layout.sources_dir.display(), "reusing extracted sources");
        None
    } else {
        if config.skip_extract {
            warn!("no extracted sources to reuse, extracting anyway");
        }
        progress.phase("Extracting vendor archives");
        Some(archive::extract_archives(layout, &config.archives, progress).await?)
    };

    // --- Stage 2: Manual gate ---
    progress.phase("Checking for Smalltalk sources");
    if gate::check_manual_source(layout) == GateStatus::Missing {
        return Ok(finish(
            progress,
            BuildOutcome::AwaitingManualStep {
                expected: layout.raw_source.clone(),
            },
        ));
    }

    // --- Stage 3: Recode ---
    progress.phase("Recoding Smalltalk sources to UTF-8");
    let recoded =
        recode::recode_file(&layout.raw_source, &layout.recoded_source, config.newlines).await?;

    // --- Stage 4: Engine check ---
    let Some(engine) = &config.engine else {
        info!(env_var = %config.engine_env_var, "no script engine configured");
        return Ok(finish(
            progress,
            BuildOutcome::EngineNotConfigured {
                env_var: config.engine_env_var.clone(),
            },
        ));
    };

    // --- Stage 5: Self-test ---
    progress.phase("Running engine self-test");
    engine::run_self_test(engine, layout, &config.self_test).await?;

    // --- Stage 6: Compile ---
    progress.phase("Compiling Smalltalk to JavaScript");
    engine::compile(
        engine,
        layout,
        &config.compiler,
        &layout.recoded_source,
        &layout.compiled_output,
    )
    .await?;

    let elapsed = start.elapsed();
    info!(
        output = %layout.compiled_output.display(),
        elapsed_ms = elapsed.as_millis() as u64,
        "build complete"
    );

    Ok(finish(
        progress,
        BuildOutcome::Compiled {
            output: layout.compiled_output.clone(),
            extracted,
            recoded,
            elapsed,
        },
    ))
}

fn finish(progress: &dyn ProgressReporter, outcome: BuildOutcome) -> BuildOutcome {
    progress.done(&outcome);
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
