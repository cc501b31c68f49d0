use thiserror::Error;

use crate::output::CommandError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// The command failed but already printed its own envelope.
	#[error("")]
	OutputAlreadyPrinted,

	/// A scene document could not be read or parsed.
	#[error("{0:#}")]
	Document(#[from] anyhow::Error),

	#[error(transparent)]
	Map(#[from] mk::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl CliError {
	pub fn is_output_already_printed(&self) -> bool {
		matches!(self, CliError::OutputAlreadyPrinted)
	}

	pub fn to_command_error(&self) -> CommandError {
		match self {
			CliError::Map(err) => CommandError::new(err.code().as_str(), err.message()),
			CliError::Document(_) => CommandError::new("INVALID_INPUT", self.to_string()),
			CliError::Io(_) => CommandError::new("IO_ERROR", self.to_string()),
			CliError::Json(_) => CommandError::new("INVALID_INPUT", self.to_string()),
			CliError::OutputAlreadyPrinted => CommandError::new("INTERNAL_ERROR", "output already printed"),
		}
	}
}

#[cfg(test)]
mod tests {
	use anyhow::Context;

	use super::*;

	#[test]
	fn test_map_errors_keep_their_code() {
		let err = CliError::from(mk::Error::validation("Invalid radius: -1. Must be a non-negative number of meters"));
		let command = err.to_command_error();
		assert_eq!(command.code, "VALIDATION_ERROR");
		assert!(command.message.starts_with("Invalid radius"));
	}

	#[test]
	fn test_document_errors_show_the_whole_chain() {
		let source: std::result::Result<(), std::io::Error> =
			Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
		let err = CliError::from(source.context("reading scene.json").unwrap_err());
		assert_eq!(err.to_string(), "reading scene.json: missing");
		assert_eq!(err.to_command_error().code, "INVALID_INPUT");
	}
}
