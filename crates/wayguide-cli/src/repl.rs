//! REPL – Read-Eval-Print Loop for the Wayguide interactive shell.
//!
//! Supported slash-commands:
//!   /help                     – show this list
//!   /mode <manual|autonomous> – switch the guidance presentation
//!   /dest <name> <x> <y> <z>  – select a destination
//!   /clear                    – drop the current destination
//!   /user <x> <y> <z>         – move the simulated user
//!   /run <seconds>            – advance simulated time
//!   /status                   – show mode, agent state and poses
//!   /settings                 – show the effective configuration
//!   /quit | /exit             – leave the shell

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use wayguide_runtime::PresentationMode;
use wayguide_types::{NavigationTarget, Vec3};

use crate::config::{self, Config};
use crate::session::Session;

/// Longest simulated span a single `/run` may cover, in seconds.
pub const MAX_RUN_SECONDS: f32 = 3600.0;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Mode(PresentationMode),
    Dest(NavigationTarget),
    Clear,
    User(Vec3),
    Run(f32),
    Status,
    Settings,
    Quit,
}

/// Parse one input line.  Names in `/dest` may contain spaces; the last
/// three words are the coordinates.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or_else(|| "empty command".to_string())?;
    let args: Vec<&str> = words.collect();

    match head {
        "/help" => Ok(Command::Help),
        "/status" => Ok(Command::Status),
        "/settings" => Ok(Command::Settings),
        "/clear" => Ok(Command::Clear),
        "/quit" | "/exit" => Ok(Command::Quit),
        "/mode" => match args.as_slice() {
            [mode] => mode.parse().map(Command::Mode).map_err(|e| e.to_string()),
            _ => Err("usage: /mode <manual|autonomous>".to_string()),
        },
        "/dest" => {
            if args.len() < 4 {
                return Err("usage: /dest <name> <x> <y> <z>".to_string());
            }
            let (name, coords) = args.split_at(args.len() - 3);
            let position = parse_vec3(coords)?;
            Ok(Command::Dest(NavigationTarget::new(name.join(" "), position)))
        }
        "/user" => parse_vec3(&args)
            .map(Command::User)
            .map_err(|_| "usage: /user <x> <y> <z>".to_string()),
        "/run" => match args.as_slice() {
            [secs] => secs
                .parse::<f32>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0 && *s <= MAX_RUN_SECONDS)
                .map(Command::Run)
                .ok_or_else(|| {
                    format!("invalid duration '{secs}' (expected 0 < seconds <= {MAX_RUN_SECONDS})")
                }),
            _ => Err("usage: /run <seconds>".to_string()),
        },
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_vec3(words: &[&str]) -> Result<Vec3, String> {
    let &[x, y, z] = words else {
        return Err("expected three coordinates".to_string());
    };
    let num = |w: &str| {
        w.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid coordinate '{w}'"))
    };
    Ok(Vec3::new(num(x)?, num(y)?, num(z)?))
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled before each prompt and between the frames of a
/// `/run`; once set the REPL exits cleanly.
pub fn run(cfg: Config, shutdown: Arc<AtomicBool>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start line editor".red(), e);
            return;
        }
    };
    let mut session = Session::new(&cfg);
    let prompt = format!("{} ", "wayguide>".bold().cyan());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(cmd);

        match parse_command(cmd) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(command) => execute(&mut session, &cfg, &shutdown, command),
            Err(e) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                e.yellow(),
                "/help".bold()
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn execute(session: &mut Session, cfg: &Config, shutdown: &AtomicBool, command: Command) {
    match command {
        Command::Help => cmd_help(),
        Command::Mode(mode) => {
            session.set_mode(mode);
            println!("{} {}", "✓ Mode set to".green(), session.mode().to_string().bold());
        }
        Command::Dest(target) => {
            let name = target.name.clone();
            match session.select_destination(target) {
                Ok(()) => println!("{} {}", "✓ Destination".green(), name.bold()),
                Err(e) => println!("{}: {}", "Destination not accepted".red(), e),
            }
        }
        Command::Clear => {
            session.clear_destination();
            println!("{}", "✓ Destination cleared".green());
        }
        Command::User(position) => {
            session.move_user(position);
            println!("{} {}", "✓ User moved to".green(), fmt_vec3(position));
        }
        Command::Run(seconds) => match session.run(seconds, shutdown) {
            Some(report) => println!(
                "  frame {} → agent {} at {}",
                report.frame.to_string().bold(),
                report.agent_state.to_string().yellow(),
                fmt_vec3(report.agent_position)
            ),
            None => println!("{}", "Nothing to run.".yellow()),
        },
        Command::Status => cmd_status(session),
        Command::Settings => cmd_settings(cfg),
        Command::Quit => {}
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Wayguide Commands".bold().underline());
    println!("  {}  – switch presentation", "/mode <manual|autonomous>".bold().cyan());
    println!("  {}   – select a destination", "/dest <name> <x> <y> <z>".bold().cyan());
    println!("  {}                     – drop the destination", "/clear".bold().cyan());
    println!("  {}          – move the simulated user", "/user <x> <y> <z>".bold().cyan());
    println!("  {}             – advance simulated time", "/run <seconds>".bold().cyan());
    println!("  {}                    – show the session state", "/status".bold().cyan());
    println!("  {}                  – show the effective settings", "/settings".bold().cyan());
    println!("  {}               – exit the shell", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_status(session: &Session) {
    let s = session.status();
    println!("{}", "Session".bold().underline());
    println!("  Mode        : {}", s.mode.to_string().yellow());
    println!(
        "  Visible     : path line {}, guide agent {}",
        on_off(s.path_line_visible),
        on_off(s.agent_visible)
    );
    println!(
        "  Agent       : {} at {}",
        s.agent_state.to_string().yellow(),
        fmt_vec3(s.agent_position)
    );
    match &s.target {
        Some(t) => println!("  Target      : {} at {}", t.name.bold(), fmt_vec3(t.position)),
        None => println!("  Target      : {}", "none".dimmed()),
    }
    if let Some(left) = s.wait_remaining {
        println!("  Waiting     : {left:.1}s left");
    }
    println!("  User        : {}", fmt_vec3(s.user_position));
    if let Some(report) = s.last_report {
        println!("  Stabilized  : {}", fmt_vec3(report.stabilized.position));
    }
    println!("  Frames      : {}", s.frames);
}

fn cmd_settings(cfg: &Config) {
    println!("{}", "Settings".bold().underline());
    println!("  Source: {}", config::config_path().display().to_string().bold());
    match toml::to_string_pretty(cfg) {
        Ok(raw) => {
            for line in raw.lines() {
                println!("  {}", line);
            }
        }
        Err(e) => println!("{}: {}", "Error rendering config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn on_off(visible: bool) -> colored::ColoredString {
    if visible { "on".green() } else { "off".dimmed() }
}
