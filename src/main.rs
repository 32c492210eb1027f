use anyhow::Result;
use clap::Parser;
use rustvox::app::{self, AppStateBuilder};
use rustvox::config::{Cli, Config};
use std::fs::File;
use tokio::select;
use tracing::{info, level_filters::LevelFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.conf {
        Some(conf) => Config::load(&conf)?,
        None => Config::default(),
    };

    let mut log_fmt = tracing_subscriber::fmt();
    if let Some(ref level) = config.log_level {
        if let Ok(lv) = level.as_str().parse::<LevelFilter>() {
            log_fmt = log_fmt.with_max_level(lv);
        }
    }

    let mut _log_guard = None;
    if let Some(ref log_file) = config.log_file {
        let file = File::create(log_file)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        _log_guard = Some(guard);
        log_fmt.with_writer(non_blocking).try_init().ok();
    } else {
        log_fmt.try_init().ok();
    }

    let state = AppStateBuilder::new().config(config).build()?;

    info!("Starting rustvox on {}", state.config.http_addr);
    select! {
        result = app::run(state.clone()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received CTRL+C, shutting down");
            state.token.cancel();
        }
    }
    Ok(())
}
