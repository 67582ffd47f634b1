use std::process::ExitCode;

fn main() -> ExitCode {
    match plydesign::cli::run() {
        Ok(code) => code,
        Err(err) => {
            plydesign::ui::output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
