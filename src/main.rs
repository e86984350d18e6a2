//! Binary entry point: read configuration, start file logging, open the
//! records store, and drive the menu until the user quits.
use school_records_manager::{logging, open_store, run_app, App, StoreConfig};

fn main() -> anyhow::Result<()> {
    let config = StoreConfig::from_env()?;
    logging::init(&config.log_file)?;
    tracing::info!(?config, "starting school records manager");

    if config.has_network_options() {
        tracing::warn!("host, port, user and password are ignored by the embedded SQLite store");
    }

    let conn = open_store(&config.database)?;
    let mut app = App::new(conn)?;
    let result = run_app(&mut app);

    if let Err(err) = &result {
        tracing::error!(error = %err, "records manager stopped with an error");
    }
    result
}
