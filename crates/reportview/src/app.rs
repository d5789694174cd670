use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use reportview_core::{InstallerFactory, MenuItemRef, Orchestrator};
use reportview_platform::{AppPaths, Platform};
use reportview_provider::UpdateProvider;
use reportview_release::{QuitHook, ReleaseProvider};
use tokio::sync::mpsc;

use crate::console::{ConsoleHost, ConsoleInput, ConsoleMenuItem, spawn_stdin_worker};
use crate::error::AppError;
use crate::settings::AppSettings;

const CONSOLE_QUEUE_CAPACITY: usize = 16;

fn http_client(settings: &AppSettings) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(settings.http_timeout_secs))
        .user_agent(format!("reportview/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::startup_failed("build HTTP client", e))
}

fn installer_factory(
    settings: &AppSettings,
    paths: &AppPaths,
    quit: mpsc::Sender<ConsoleInput>,
) -> Result<InstallerFactory, AppError> {
    let client = http_client(settings)?;
    let channel = settings.release_channel();
    let cache_dir = paths.updater_cache_dir();
    let quit_hook: QuitHook = Arc::new(move || {
        if quit.try_send(ConsoleInput::Quit).is_err() {
            warn!("Could not request shutdown after launching the installer");
        }
    });

    Ok(Box::new(move || {
        let provider =
            ReleaseProvider::new(client, channel, env!("CARGO_PKG_VERSION"), cache_dir)
                .with_quit_hook(quit_hook);
        Arc::new(provider) as Arc<dyn UpdateProvider>
    }))
}

pub async fn run(settings: AppSettings, paths: &AppPaths) -> Result<(), AppError> {
    let platform = Platform::current();
    info!(
        "reportview {} starting on {platform}",
        env!("CARGO_PKG_VERSION")
    );

    let (input_tx, mut input_rx) = mpsc::channel(CONSOLE_QUEUE_CAPACITY);
    let factory = installer_factory(&settings, paths, input_tx.clone())?;

    let host = Arc::new(ConsoleHost::stdout());
    let orchestrator = Orchestrator::new(
        settings.updater_config(),
        platform,
        host.clone(),
        factory,
    );
    let updater = orchestrator.handle();
    let running = tokio::spawn(orchestrator.run());

    let menu = Arc::new(ConsoleMenuItem::new("Check for updates"));
    spawn_stdin_worker(input_tx);
    println!("Commands: check, install, quit. Answer prompts with y, n or close.");

    if settings.check_on_startup {
        updater.check_for_updates_and_notify(false);
    }

    while let Some(input) = input_rx.recv().await {
        match input {
            ConsoleInput::Check if !menu.is_enabled() => {
                println!("An update check is already running");
            }
            ConsoleInput::Check => updater.check_for_updates(Some(menu.clone() as MenuItemRef)),
            ConsoleInput::Install => updater.quit_and_install(),
            ConsoleInput::Answer(result) => {
                if !host.answer(result) {
                    println!("No update prompt is open");
                }
            }
            ConsoleInput::Quit => break,
        }
    }

    host.close_window();
    updater.shutdown();
    running
        .await
        .map_err(|e| AppError::operation_failed("Stop updater", e))?;
    info!("reportview stopped");
    Ok(())
}
