//! Error taxonomy for the map runtime.
//!
//! Every failure the runtime and scene layer surface carries one of seven
//! stable [`ErrorCode`]s. Hosts switch on the code; the message is for humans.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	LoadError,
	NotLoaded,
	InitError,
	TokenError,
	ContextError,
	ValidationError,
	UnknownError,
}

impl ErrorCode {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::LoadError => "LOAD_ERROR",
			ErrorCode::NotLoaded => "NOT_LOADED",
			ErrorCode::InitError => "INIT_ERROR",
			ErrorCode::TokenError => "TOKEN_ERROR",
			ErrorCode::ContextError => "CONTEXT_ERROR",
			ErrorCode::ValidationError => "VALIDATION_ERROR",
			ErrorCode::UnknownError => "UNKNOWN_ERROR",
		}
	}

	/// Message used when a failure carries no detail of its own.
	pub fn default_message(self) -> &'static str {
		match self {
			ErrorCode::LoadError => "Failed to load MapKit JS",
			ErrorCode::NotLoaded => "MapKit JS not loaded",
			ErrorCode::InitError => "Failed to initialize MapKit",
			ErrorCode::TokenError => "Failed to fetch or validate MapKit token",
			ErrorCode::ContextError => "MapKit context error",
			ErrorCode::ValidationError => "Validation error",
			ErrorCode::UnknownError => "An unknown error occurred",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Errors surfaced by the session, the engine seams and the scene layer.
///
/// `Clone` so one bootstrap outcome can be handed to every caller sharing it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	/// The engine script could not be injected.
	#[error("{0}")]
	LoadFailed(String),

	/// Scripts loaded but the engine namespace is missing.
	#[error("{0}")]
	NotLoaded(String),

	/// The engine or a map could not be initialized.
	#[error("{0}")]
	InitFailed(String),

	/// Token fetch or validation failed after retries.
	#[error("{0}")]
	TokenFailed(String),

	/// The shared session was used where none is installed.
	#[error("{0}")]
	Context(String),

	/// Geometry or descriptor input was rejected before reaching the engine.
	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	Unknown(String),
}

impl Error {
	/// Builds an error with the code's default message.
	pub fn from_code(code: ErrorCode) -> Self {
		Self::with_message(code, code.default_message())
	}

	pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
		let message = message.into();
		match code {
			ErrorCode::LoadError => Error::LoadFailed(message),
			ErrorCode::NotLoaded => Error::NotLoaded(message),
			ErrorCode::InitError => Error::InitFailed(message),
			ErrorCode::TokenError => Error::TokenFailed(message),
			ErrorCode::ContextError => Error::Context(message),
			ErrorCode::ValidationError => Error::Validation(message),
			ErrorCode::UnknownError => Error::Unknown(message),
		}
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Error::Validation(message.into())
	}

	pub fn code(&self) -> ErrorCode {
		match self {
			Error::LoadFailed(_) => ErrorCode::LoadError,
			Error::NotLoaded(_) => ErrorCode::NotLoaded,
			Error::InitFailed(_) => ErrorCode::InitError,
			Error::TokenFailed(_) => ErrorCode::TokenError,
			Error::Context(_) => ErrorCode::ContextError,
			Error::Validation(_) => ErrorCode::ValidationError,
			Error::Unknown(_) => ErrorCode::UnknownError,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			Error::LoadFailed(m)
			| Error::NotLoaded(m)
			| Error::InitFailed(m)
			| Error::TokenFailed(m)
			| Error::Context(m)
			| Error::Validation(m)
			| Error::Unknown(m) => m,
		}
	}

	pub fn is_validation(&self) -> bool {
		matches!(self, Error::Validation(_))
	}

	/// Folds an arbitrary failure into the taxonomy as `UNKNOWN_ERROR`.
	///
	/// An empty message falls back to the code's default.
	pub fn unknown(source: impl fmt::Display) -> Self {
		let message = source.to_string();
		if message.is_empty() {
			Error::from_code(ErrorCode::UnknownError)
		} else {
			Error::Unknown(message)
		}
	}

	/// Keeps validation failures as they are and reclassifies everything else
	/// as `UNKNOWN_ERROR`, prefixing the message with `context`.
	pub fn scoped(self, context: &str) -> Self {
		match self {
			Error::Validation(_) => self,
			other => Error::Unknown(format!("{context}: {}", other.message())),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::unknown(err)
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		if err.is_panic() {
			Error::Unknown("bootstrap task panicked".to_string())
		} else {
			Error::Unknown("bootstrap task was cancelled".to_string())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_codes_round_trip_through_messages() {
		for code in [
			ErrorCode::LoadError,
			ErrorCode::NotLoaded,
			ErrorCode::InitError,
			ErrorCode::TokenError,
			ErrorCode::ContextError,
			ErrorCode::ValidationError,
			ErrorCode::UnknownError,
		] {
			let err = Error::from_code(code);
			assert_eq!(err.code(), code);
			assert_eq!(err.to_string(), code.default_message());
		}
		assert_eq!(
			serde_json::to_value(ErrorCode::TokenError).unwrap(),
			serde_json::json!("TOKEN_ERROR")
		);
	}

	#[test]
	fn test_scoped_keeps_validation() {
		let err = Error::validation("Invalid latitude: 95").scoped("invalid annotation \"a\"");
		assert_eq!(err, Error::Validation("Invalid latitude: 95".to_string()));

		let err = Error::InitFailed("boom".to_string()).scoped("failed to create overlay \"o\"");
		assert_eq!(err.code(), ErrorCode::UnknownError);
		assert_eq!(err.message(), "failed to create overlay \"o\": boom");
	}

	#[test]
	fn test_unknown_falls_back_to_default_message() {
		assert_eq!(Error::unknown("").message(), "An unknown error occurred");
		assert_eq!(Error::unknown("socket closed").message(), "socket closed");
	}
}
