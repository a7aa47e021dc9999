use std::process::ExitCode;

use chassis::ui::output;

fn main() -> ExitCode {
    match chassis::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
