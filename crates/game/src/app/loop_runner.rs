use std::process::ExitCode;

use loz_engine::{run_desktop, AppError, World, WorldWiring};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::world::RoomWorld;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let build_world = |wiring: WorldWiring| -> Box<dyn World> { Box::new(RoomWorld::new(wiring)) };
    match run_desktop(app.config, build_world) {
        Ok(()) => {
            info!("exit_clean");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err.exit_code();
            log_failure(&err, code);
            ExitCode::from(code)
        }
    }
}

fn log_failure(err: &AppError, code: u8) {
    match err {
        AppError::Bootstrap(startup) => {
            error!(stage = startup.stage.name(), exit_code = code, error = %startup, "startup_failed");
        }
        AppError::Loop(_) => {
            error!(exit_code = code, error = %err, "loop_failed");
        }
    }
}
