use std::process::ExitCode;

fn main() -> ExitCode {
    match automation_diffusion::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("autodiff: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
