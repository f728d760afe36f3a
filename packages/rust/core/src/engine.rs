//! External script engine invocation (Mozilla's JS shell, typically).
//!
//! The engine command line comes from the environment as one string, e.g.
//! `"/opt/mozjs/js -m -n"`. It is split into a program and leading flags and
//! run with an explicit argument list; no shell is involved.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use webscratch_shared::{BuildLayout, Result, WebscratchError};

/// Program plus flags taken from the engine environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub flags: Vec<String>,
}

impl EngineCommand {
    /// Split a configured command line on whitespace. `None` when blank.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            flags: parts.collect(),
        })
    }

    /// Full argument list for running `script` with `args`.
    ///
    /// Arguments stay `OsStr` so non-UTF-8 paths reach the engine byte for byte.
    fn argv<'a>(&'a self, script: &'a str, args: &'a [&'a OsStr]) -> Vec<&'a OsStr> {
        let mut argv: Vec<&OsStr> = self.flags.iter().map(OsStr::new).collect();
        argv.push(OsStr::new(script));
        argv.extend_from_slice(args);
        argv
    }

    fn command(&self, script: &str, args: &[&OsStr], cwd: &Path) -> Command {
        let argv = self.argv(script, args);
        let shown: Vec<_> = argv.iter().map(|a| a.to_string_lossy()).collect();
        info!(
            cwd = %cwd.display(),
            "{} {}",
            self.program,
            shown.join(" ")
        );
        let mut cmd = Command::new(&self.program);
        cmd.args(&argv).current_dir(cwd).stdin(Stdio::null());
        cmd
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for flag in &self.flags {
            write!(f, " {flag}")?;
        }
        Ok(())
    }
}

/// Run the engine's own test script from `js/tests`.
#[instrument(skip_all, fields(engine = %engine, script = %script))]
pub async fn run_self_test(engine: &EngineCommand, layout: &BuildLayout, script: &str) -> Result<()> {
    let status = engine
        .command(script, &[], &layout.tests_dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| spawn_error(engine, e))?;

    if !status.success() {
        return Err(WebscratchError::EngineFailed {
            step: format!("self-test {script}"),
            status,
        });
    }
    debug!("self-test passed");
    Ok(())
}

/// Run the compiler from `js/` on `input`, streaming its stdout into `output`.
///
/// `output` is truncated first. Whatever the engine printed stays in place
/// when it fails.
#[instrument(skip_all, fields(engine = %engine, compiler = %compiler, input = %input.display()))]
pub async fn compile(
    engine: &EngineCommand,
    layout: &BuildLayout,
    compiler: &str,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let sink = tokio::fs::File::create(output)
        .await
        .map_err(|e| WebscratchError::io(output, e))?
        .into_std()
        .await;

    info!(output = %output.display(), "capturing compiler output");
    let status = engine
        .command(compiler, &[input.as_os_str()], &layout.js_dir)
        .stdout(Stdio::from(sink))
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| spawn_error(engine, e))?;

    if !status.success() {
        return Err(WebscratchError::EngineFailed {
            step: format!("compiling with {compiler}"),
            status,
        });
    }
    Ok(())
}

fn spawn_error(engine: &EngineCommand, source: std::io::Error) -> WebscratchError {
    WebscratchError::EngineSpawn {
        program: engine.program.clone(),
        source,
    }
}
