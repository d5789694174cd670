mod app;
mod console;
mod error;
mod logging;
mod settings;

use std::process::ExitCode;

use reportview_platform::AppPaths;

use crate::error::AppError;
use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> ExitCode {
    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("reportview: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> Result<(), AppError> {
    let paths =
        AppPaths::new().map_err(|e| AppError::startup_failed("resolve app directories", e))?;
    paths
        .ensure_dirs()
        .map_err(|e| AppError::startup_failed("create app directories", e))?;

    let settings_path = paths.settings_file();
    let settings = AppSettings::load_from(&settings_path);
    logging::init_logging(
        &paths.log_file(),
        settings.debug_logging,
        settings.max_log_size_bytes,
    );
    if !settings_path.exists()
        && let Err(e) = settings.save_to(&settings_path)
    {
        log::warn!("Failed to write default settings: {e}");
    }

    app::run(settings, &paths).await
}
