mod play;

use std::fmt;

use services::{AppServices, Clock};
use trivia_core::EngineSettings;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDebounceMs { raw: String },
    InvalidLowThreshold { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDebounceMs { raw } => write!(f, "invalid --debounce-ms value: {raw}"),
            ArgsError::InvalidLowThreshold { raw } => {
                write!(f, "invalid --low-threshold value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  trivia play  [--db <sqlite_url>] [--debounce-ms <ms>] [--low-threshold <n>]");
    eprintln!("  trivia reset [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:trivia.sqlite3");
    eprintln!("  --debounce-ms 300");
    eprintln!("  --low-threshold 5");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_DB_URL, TRIVIA_DEBOUNCE_MS, TRIVIA_LOW_THRESHOLD, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    debounce_ms: Option<u64>,
    low_threshold: Option<usize>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("TRIVIA_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:trivia.sqlite3".into()), normalize_sqlite_url);
        let mut debounce_ms = std::env::var("TRIVIA_DEBOUNCE_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());
        let mut low_threshold = std::env::var("TRIVIA_LOW_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--debounce-ms" => {
                    let value = require_value(args, "--debounce-ms")?;
                    let parsed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDebounceMs { raw: value.clone() })?;
                    debounce_ms = Some(parsed);
                }
                "--low-threshold" => {
                    let value = require_value(args, "--low-threshold")?;
                    let parsed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLowThreshold { raw: value.clone() })?;
                    low_threshold = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            debounce_ms,
            low_threshold,
        })
    }

    fn settings(&self) -> Result<EngineSettings, Box<dyn std::error::Error>> {
        let mut settings = EngineSettings::default();
        if let Some(ms) = self.debounce_ms {
            settings = settings.with_debounce_ms(ms)?;
        }
        if let Some(threshold) = self.low_threshold {
            settings = settings.with_low_cards_threshold(threshold)?;
        }
        Ok(settings)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings()?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, settings, Clock::default_clock()).await?;

    match cmd {
        Command::Play => play::run(&services).await,
        Command::Reset => {
            tracing::info!(db_url = %parsed.db_url, "clearing saved session");
            if services.clear_saved_session().await {
                println!("saved session cleared");
            } else {
                eprintln!("could not clear the saved session; see log");
            }
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
