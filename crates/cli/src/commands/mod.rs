//! Command implementations and dispatch.

mod replay;
mod validate;

use std::path::Path;

use anyhow::Context;
use mk::protocol::{SceneDocument, SessionOptions};

pub use replay::{PassReport, ReplayReport};
pub use validate::{Problem, ValidateReport};

use crate::cli::Commands;
use crate::error::{CliError, Result};
use crate::output::{self, CommandError, CommandResult, OutputFormat};

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Replay { .. } => "replay",
			Commands::Validate { .. } => "validate",
		}
	}
}

pub async fn dispatch(command: Commands, format: OutputFormat) -> Result<()> {
	let name = command.name();
	match command {
		Commands::Replay {
			files,
			language,
			version,
			libraries,
		} => {
			let options = SessionOptions {
				language,
				version,
				libraries,
				..SessionOptions::default()
			};
			let report = replay::run(&files, options).await?;
			output::print_result(&CommandResult::success(name, report), format);
			Ok(())
		}
		Commands::Validate { file } => {
			let report = validate::run(&file)?;
			if report.problems.is_empty() {
				output::print_result(&CommandResult::success(name, report), format);
				return Ok(());
			}

			let error = CommandError::new(
				mk::ErrorCode::ValidationError.as_str(),
				format!("{} problem(s) in {}", report.problems.len(), file.display()),
			);
			output::print_error_stderr(&error);
			output::print_result(&CommandResult::failure(name, error).with_data(report), format);
			Err(CliError::OutputAlreadyPrinted)
		}
	}
}

pub(crate) fn load_document(path: &Path) -> anyhow::Result<SceneDocument> {
	let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
