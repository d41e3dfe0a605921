//! Command-line arguments and their mapping onto transform requests.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thumbkit_core::TransformRequest;

/// Resize, rotate and auto-orient JPEG, PNG and GIF images.
#[derive(Parser, Debug)]
#[command(name = "thumbkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JPEG output quality (1-100), overriding the configuration
    #[arg(short, long, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    #[command(subcommand)]
    pub command: Command,
}

/// What a command asks the core library to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Transform(TransformRequest),
    Identify(PathBuf),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shrink to fit inside WIDTHxHEIGHT, or crop to exactly that size
    Resize {
        input: PathBuf,
        output: PathBuf,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
        /// 1 to crop to exactly WIDTHxHEIGHT, 0 to fit inside it
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set, required = true)]
        crop_to_size: bool,
        /// 1 to rotate as the EXIF orientation tag says, 0 to ignore it
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set, required = true)]
        auto_orient: bool,
    },
    /// Rotate clockwise by 90, 180 or 270 degrees
    Rotate {
        input: PathBuf,
        output: PathBuf,
        #[arg(allow_negative_numbers = true)]
        degrees: i32,
    },
    /// Rotate as the EXIF orientation tag says and mark the result upright
    Autorotate { input: PathBuf, output: PathBuf },
    /// Print the format and size of an image without decoding it
    Identify { input: PathBuf },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Resize { .. } => "resize",
            Command::Rotate { .. } => "rotate",
            Command::Autorotate { .. } => "autorotate",
            Command::Identify { .. } => "identify",
        }
    }

    pub fn action(&self) -> Action {
        let request = match self.clone() {
            Command::Resize {
                input,
                output,
                width,
                height,
                crop_to_size,
                auto_orient,
            } => TransformRequest::resize(input, output, width, height, crop_to_size, auto_orient),
            Command::Rotate {
                input,
                output,
                degrees,
            } => TransformRequest::rotate(input, output, degrees),
            Command::Autorotate { input, output } => TransformRequest::auto_orient(input, output),
            Command::Identify { input } => return Action::Identify(input),
        };
        Action::Transform(request)
    }
}

/// Integer switch: zero is off, any other integer is on.
fn parse_switch(value: &str) -> Result<bool, String> {
    value
        .trim()
        .parse::<i64>()
        .map(|n| n != 0)
        .map_err(|_| format!("expected 0 or 1, got '{}'", value))
}
