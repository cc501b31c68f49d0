//! Result envelope shared by every command.
//!
//! JSON output is one document on stdout:
//!
//! ```json
//! { "ok": true, "command": "replay", "data": { ... } }
//! ```
//!
//! Failures carry `error` instead of (or next to) `data`, and are also
//! written to stderr in a human-readable form.

use std::fmt::Write as _;

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON envelope
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// Text rendering for command payloads.
pub trait Render {
	fn render(&self, out: &mut String);
}

impl Render for () {
	fn render(&self, _out: &mut String) {}
}

#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: &str, data: T) -> Self {
		Self {
			ok: true,
			command: command.to_string(),
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(command: &str, error: CommandError) -> Self {
		Self {
			ok: false,
			command: command.to_string(),
			data: None,
			error: Some(error),
		}
	}

	/// Keeps the payload so callers can see what was checked.
	pub fn with_data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
	/// Runtime error code (`VALIDATION_ERROR`, ...) or a CLI-level code
	/// such as `IO_ERROR`.
	pub code: String,
	pub message: String,
}

impl CommandError {
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			message: message.into(),
		}
	}
}

pub fn print_result<T: Serialize + Render>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			let mut out = String::new();
			if let Some(data) = &result.data {
				data.render(&mut out);
			}
			if let Some(error) = &result.error {
				let _ = writeln!(out, "{}: {}", error.code, error.message);
			}
			print!("{out}");
		}
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}
