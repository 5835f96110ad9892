//! PORTAL desktop entry point.
//!
//! Runs the web shell controller headless: splash, then the main screen
//! driven by a TCP connectivity watcher, a headless browsing surface and a
//! stdin console standing in for touch input and page script.
//! Pass a TOML config path as the first argument or in `PORTAL_CONFIG`.

mod console;
mod surface;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use console::Console;
use portal_core::{PushHandler, ShellController, ShellServices, SplashScreen};
use portal_net::{ConnectivityWatcher, TcpProbe};
use portal_platform::{ConnectivityProbe, DesktopPlatform};
use portal_store::{FileStore, SharedStore};
use portal_types::config::ShellConfig;
use portal_types::looper::Looper;
use surface::HeadlessSurface;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config from CLI arg, PORTAL_CONFIG env var, or defaults.
    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PORTAL_CONFIG").ok())
    {
        Some(path) => ShellConfig::load(&PathBuf::from(&path))
            .with_context(|| format!("loading config {path}"))?,
        None => ShellConfig::default(),
    };
    log::info!(
        "Starting {} shell v{} for {}",
        config.app_name,
        config.app_version,
        config.base_url
    );

    SplashScreen::from_config(&config.splash)
        .run(std::thread::sleep, |message| log::info!("[splash] {message}"));

    let store = match &config.store_path {
        Some(path) => SharedStore::new(
            FileStore::open(path).with_context(|| format!("opening store {}", path.display()))?,
        ),
        None => SharedStore::in_memory(),
    };

    let probe: Arc<dyn ConnectivityProbe> = Arc::new(TcpProbe::from_config(&config.probe));
    let looper = Looper::new();
    let surface = HeadlessSurface::new(
        looper.handle(),
        config.probe.timeout(),
        config.document_dir.clone(),
    );
    let services = ShellServices {
        platform: Box::new(DesktopPlatform::new()),
        surface: Box::new(surface),
        connectivity: Box::new(ConnectivityWatcher::new(
            Arc::clone(&probe),
            config.probe.poll_interval(),
        )),
        probe,
        store: store.clone(),
    };
    let push = PushHandler::from_config(&config);
    let mut shell = ShellController::new(config, looper, services);

    let console = Console::new(shell.handle(), shell.bridge(), store, push);
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || console.run())
        .context("starting console thread")?;

    shell.start();
    shell.on_start();
    shell.on_resume();
    shell.run();
    shell.on_pause();
    shell.on_stop();
    shell.destroy();

    log::info!("Shutting down");
    Ok(())
}
