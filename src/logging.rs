//! env_logger setup.
//!
//! The CLI logs to stderr. The TUI owns the terminal, so it logs to a file.

use crate::config::Config;
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;

/// Environment variable holding the log filter (`RUST_LOG` syntax).
pub const LOG_ENV: &str = "SMARTSUM_LOG";

fn builder(config: &Config) -> Builder {
    Builder::from_env(Env::default().filter_or(LOG_ENV, config.logging.level.as_str()))
}

/// Log to stderr. Safe to call more than once.
pub fn init_stderr(config: &Config) {
    let _ = builder(config).target(Target::Stderr).try_init();
}

/// Log to the configured file, creating parent directories as needed.
pub fn init_file(config: &Config) -> std::io::Result<()> {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let _ = builder(config)
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    log::info!("logging to {}", path.display());
    Ok(())
}
