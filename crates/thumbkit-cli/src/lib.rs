//! Thumbkit CLI - command-line front end for thumbkit-core
//!
//! ```text
//! thumbkit [--config FILE] [--quality Q] resize <in> <out> <width> <height> <crop:0|1> <auto_orient:0|1>
//! thumbkit [--config FILE] [--quality Q] rotate <in> <out> <degrees>
//! thumbkit [--config FILE] [--quality Q] autorotate <in> <out>
//! thumbkit [--config FILE] identify <in>
//! ```
//!
//! On success the output path and its final size are printed to stdout.
//! `identify` prints the input path, its format and its size.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use thumbkit_core::{Config, ConfigError, ImageInfo, TransformResult};

mod commands;
pub mod logging;

pub use commands::{Action, Cli, Command};

/// Errors reported by [`run`].
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{command} failed: {source}")]
    Transform {
        command: &'static str,
        #[source]
        source: thumbkit_core::Error,
    },
}

/// A completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transformed {
        output: PathBuf,
        result: TransformResult,
    },
    Identified {
        input: PathBuf,
        info: ImageInfo,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Transformed { output, result } => write!(
                f,
                "{}: {}x{}",
                output.display(),
                result.new_width,
                result.new_height
            ),
            Outcome::Identified { input, info } => write!(f, "{}: {}", input.display(), info),
        }
    }
}

/// Load the configuration named on the command line, with overrides applied.
pub fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(quality) = cli.quality {
        config.transform.jpeg_quality = quality;
    }
    Ok(config)
}

/// Run the parsed command.
pub fn run(cli: &Cli) -> Result<Outcome, CliError> {
    let config = load_config(cli)?;
    let runtime = thumbkit_core::init(config.limits);
    let transformer = runtime.transformer(config.transform);

    let command = cli.command.name();
    let failed = |source: thumbkit_core::Error| CliError::Transform { command, source };

    match cli.command.action() {
        Action::Transform(request) => {
            tracing::debug!(command, ?request, "Running command");
            let result = transformer.transform(&request).map_err(failed)?;
            Ok(Outcome::Transformed {
                output: request.dst_path,
                result,
            })
        }
        Action::Identify(input) => {
            tracing::debug!(command, input = %input.display(), "Running command");
            let info = transformer.identify(&input).map_err(failed)?;
            Ok(Outcome::Identified { input, info })
        }
    }
}
