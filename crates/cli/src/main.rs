use clap::Parser;
use mk_cli::cli::Cli;
use mk_cli::error::CliError;
use mk_cli::output::{self, CommandResult, OutputFormat};
use mk_cli::{commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli.command, format).await {
		if !err.is_output_already_printed() {
			handle_error(command, err, format);
		}
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: CliError, format: OutputFormat) {
	let cmd_error = err.to_command_error();
	output::print_error_stderr(&cmd_error);

	if format == OutputFormat::Json {
		let result: CommandResult<()> = CommandResult::failure(command, cmd_error);
		output::print_result(&result, format);
	}
}
