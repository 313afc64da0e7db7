//! `wayguide-cli` – Wayguide Command Line Interface
//!
//! Interactive front-end for the guidance stack running against simulated
//! drivers.  It:
//!
//! 1. Initialises logging via [`wayguide_runtime::init_tracing`].
//! 2. Loads `~/.wayguide/config.toml`, writing the defaults on first run.
//! 3. Drops the user into an **interactive REPL** where destinations are
//!    selected, the user is moved and simulated time is advanced.
//! 4. Intercepts **Ctrl-C** to leave the shell cleanly.

mod config;
mod repl;
mod session;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

fn main() {
    // RUST_LOG selects the filter, WAYGUIDE_LOG_FORMAT=json switches to
    // newline-delimited JSON.  User-facing output stays on println!.
    let _telemetry = wayguide_runtime::init_tracing("wayguide");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – leaving Wayguide …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(
            error = %e,
            "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available"
        );
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run_config(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    println!(
        "  Starting in {} mode at {} Hz.",
        cfg.session.initial_mode.to_string().bold(),
        cfg.session.frame_rate
    );
    println!();
    println!(
        "  Type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(cfg, shutdown);
}

/// Write the default configuration so the user has a file to edit, then
/// apply any environment overrides on top of it.
fn first_run_config() -> config::Config {
    let mut cfg = config::Config::default();
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    config::apply_env_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        println!("{}: {}", "Config error".red(), e);
        println!("  Ignoring environment overrides.");
        cfg = config::Config::default();
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#" _      __                   _    __   "#.bold().cyan());
    println!("{}", r#"| | /| / /__ ___ _____ ___ _(_)__/ /__ "#.bold().cyan());
    println!("{}", r#"| |/ |/ / _ `/ // / _ `/ // / / _  / -_)"#.bold().cyan());
    println!("{}", r#"|__/|__/\_,_/\_, /\_, /\_,_/_/\_,_/\__/ "#.bold().cyan());
    println!("{}", r#"            /___//___/                  "#.bold().cyan());
    println!();
    println!("  {} {}",
        "Wayguide".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  AR destination guidance");
    println!();
}
