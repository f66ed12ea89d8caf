//! termscreen-demo - interactive tour of the termscreen backends
//!
//! Opens a buffered screen, draws the color and style registries as a
//! sheet and logs every keystroke it reads. Resizing the terminal redraws
//! the whole screen; everything else goes out as a delta.
//!
//! # Quick Start
//!
//! ```text
//! termscreen-demo                  # Run in the current terminal
//! termscreen-demo --headless       # Scripted run on an in-memory terminal
//! termscreen-demo -c demo.toml     # Use a specific config file
//! ```

use std::collections::VecDeque;
use std::env;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use termscreen::{
    with_session, BackendKind, Color, Config, DrawOptions, Input, Key, Output, Position,
    RedrawMode, Screen, Sheet, SheetItem, Style,
};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter
const LOG_ENV: &str = "TERMSCREEN_LOG";

/// Row where the key log starts
const LOG_TOP: u16 = 8;

struct Args {
    config_path: Option<PathBuf>,
    headless: bool,
}

fn print_version() {
    eprintln!("termscreen-demo {}", VERSION);
}

fn print_help() {
    eprintln!("termscreen-demo {} - terminal and screen backend demo", VERSION);
    eprintln!();
    eprintln!("Usage: termscreen-demo [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Read configuration from PATH");
    eprintln!("      --headless        Run a scripted session on an in-memory terminal");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  q, Esc                Quit");
    eprintln!("  (anything else)       Show its normalized keystroke");
    eprintln!();
    eprintln!("Configuration: ~/.termscreen/config.toml");
    eprintln!("Log file:      ~/.termscreen/termscreen.log ({} sets the level)", LOG_ENV);
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        config_path: None,
        headless: false,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            "--headless" => {
                parsed.headless = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to a file so output never lands on the drawn screen
fn init_logging() {
    let log_path = Config::get_config_path()
        .and_then(|path| path.parent().map(|dir| dir.join("termscreen.log")))
        .unwrap_or_else(|| PathBuf::from("termscreen.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Every color and style, each drawn in itself
fn registry_sheet() -> Sheet {
    let colors = Color::ALL.iter().flat_map(|&color| {
        [
            SheetItem::styled(color.name(), DrawOptions::new().fg(color)),
            SheetItem::Char(' '),
        ]
    });
    let backgrounds = Color::ALL.iter().flat_map(|&color| {
        let fg = if color == Color::Black { Color::White } else { Color::Black };
        [
            SheetItem::styled(color.name(), DrawOptions::new().fg(fg).bg(color)),
            SheetItem::Char(' '),
        ]
    });
    let styles = Style::ALL.iter().flat_map(|&style| {
        [
            SheetItem::styled(style.name(), DrawOptions::new().styles(style)),
            SheetItem::Char(' '),
        ]
    });

    Sheet::new()
        .row(colors.collect::<Vec<_>>())
        .row(backgrounds.collect::<Vec<_>>())
        .row(styles.collect::<Vec<_>>())
}

fn draw(screen: &mut Screen, sheet: &Sheet, log: &VecDeque<String>) -> termscreen::Result<()> {
    let size = screen.size();
    let bold = DrawOptions::new().styles(Style::Bold);
    let dim = DrawOptions::new().fg(Color::Cyan);

    screen.clear()?;
    screen.write_str(
        &format!("termscreen-demo {}  [{}]", VERSION, size),
        Some(Position::new(1, 0)),
        &bold,
    )?;
    screen.write_str("Press keys; q or Esc quits.", Some(Position::new(1, 1)), &dim)?;
    screen.put_sheet(Position::new(1, 3), sheet)?;

    screen.write_str("Keys:", Some(Position::new(1, LOG_TOP - 1)), &bold)?;
    for (i, line) in log.iter().enumerate() {
        screen.write_str(line, Some(Position::new(3, LOG_TOP + i as u16)), &DrawOptions::new())?;
    }

    let stats = screen.last_redraw();
    let status = match stats {
        Some(s) => format!("last redraw: {:?}, {} cells written", s.mode, s.cells_written),
        None => "last redraw: none".to_string(),
    };
    screen.write_str(
        &status,
        Some(Position::new(1, size.rows.saturating_sub(1))),
        &DrawOptions::new().styles(Style::Reverse),
    )?;
    screen.redraw(RedrawMode::Auto)?;
    Ok(())
}

/// Read and show keystrokes until quit or end of input
fn run(screen: &mut Screen) -> termscreen::Result<usize> {
    let sheet = registry_sheet();
    with_session(screen, |s| {
        let mut log: VecDeque<String> = VecDeque::new();
        let mut seen = 0;
        loop {
            draw(s, &sheet, &log)?;
            let keystroke = s.get()?;
            match keystroke.key {
                Key::Escape | Key::Eof => break,
                Key::Char('q') if keystroke.modifiers.is_empty() => break,
                _ => {}
            }
            seen += 1;
            info!("Keystroke: {} ({})", keystroke, keystroke.key.name());

            let capacity = s.size().rows.saturating_sub(LOG_TOP + 1).max(1) as usize;
            log.push_back(format!("{:>4}  {:<16} {}", seen, keystroke.to_string(), keystroke.key.name()));
            while log.len() > capacity {
                log.pop_front();
            }
        }
        Ok(seen)
    })
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("termscreen-demo starting...");

    let mut config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if args.headless {
        config.backend = BackendKind::Headless;
    }
    let config = config.with_resize_listener(|cols, rows| {
        info!("Terminal resized to {}x{}", cols, rows);
    });

    match config.backend {
        BackendKind::Console => {
            let mut screen = Screen::open(config)?;
            let seen = run(&mut screen)?;
            info!("Read {} keystrokes", seen);
        }
        BackendKind::Headless => {
            let (mut screen, monitor) = Screen::headless(config)?;
            for ch in "hi".chars() {
                monitor.push_char(ch);
            }
            monitor.push_key(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE));
            monitor.push_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
            monitor.end_input();

            let seen = run(&mut screen)?;
            if seen != 4 {
                warn!("Scripted run read {} keystrokes, expected 4", seen);
            }
            // The device left the alternate screen; print the back buffer instead
            println!("Read {} keystrokes (font: {})", seen, screen.terminal().font());
            let size = screen.size();
            for row in 0..size.rows {
                let line: String = (0..size.cols)
                    .filter_map(|col| screen.cell(Position::new(col, row)))
                    .map(|cell| cell.ch)
                    .collect();
                println!("{}", line.trim_end());
            }
        }
    }

    Ok(())
}
