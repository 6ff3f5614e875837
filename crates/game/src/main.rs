use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let wiring = app::bootstrap::build_app();
    app::loop_runner::run(wiring)
}
