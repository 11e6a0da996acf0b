//! pipeline-helpers binary entry point.

use std::process::ExitCode;

use pipeline_helpers::cli::{self, Cli};
use pipeline_helpers::core::config::Config;
use pipeline_helpers::logging;
use pipeline_helpers::ui::output::{print_error, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            print_error(e, None);
            return ExitCode::FAILURE;
        }
    };

    let log_file = logging::init(verbosity, &config);
    match cli::run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("Error occurred: {:?}", err);
            print_error(format!("{:#}", err), log_file.as_deref());
            ExitCode::FAILURE
        }
    }
}
