use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mk")]
#[command(about = "Replay and validate declarative map scenes against a headless engine")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Apply scene documents in order, reporting the engine operations of each pass
	Replay {
		/// Scene documents, one reconcile pass each
		#[arg(required = true, value_name = "SCENE")]
		files: Vec<PathBuf>,

		/// Engine UI language
		#[arg(long, default_value = "en")]
		language: String,

		/// Engine script version segment
		#[arg(long = "engine-version", default_value = "5.x.x")]
		version: String,

		/// Extra engine library to load (repeatable)
		#[arg(long = "library", value_name = "NAME")]
		libraries: Vec<String>,
	},

	/// Check every descriptor in a scene document without an engine
	Validate {
		#[arg(value_name = "SCENE")]
		file: PathBuf,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_replay_accepts_repeated_libraries() {
		let cli = Cli::try_parse_from([
			"mk", "-vv", "-f", "json", "replay", "a.json", "b.json", "--library", "map", "--library", "services",
		])
		.unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
		match cli.command {
			Commands::Replay {
				files,
				language,
				libraries,
				..
			} => {
				assert_eq!(files.len(), 2);
				assert_eq!(language, "en");
				assert_eq!(libraries, vec!["map", "services"]);
			}
			other => panic!("expected replay, got {other:?}"),
		}
	}

	#[test]
	fn test_replay_requires_a_file() {
		assert!(Cli::try_parse_from(["mk", "replay"]).is_err());
	}
}
