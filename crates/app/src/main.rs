use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use lesson_core::model::ModuleId;
use services::{AppConfig, AppServices, CatalogMode};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::vm::{ModuleCardKind, NavState};
use ui::{SessionHost, UiApp, build_app_context};
use url::Url;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUrl { flag: &'static str, raw: String },
    InvalidMode { raw: String },
    InvalidModuleId { raw: String },
    MissingModuleId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUrl { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected local, remote or both)")
            }
            ArgsError::InvalidModuleId { raw } => write!(f, "invalid module id: {raw:?}"),
            ArgsError::MissingModuleId => write!(f, "walk requires a module id"),
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

fn parse_url(flag: &'static str, raw: String) -> Result<Url, ArgsError> {
    Url::parse(&raw).map_err(|_| ArgsError::InvalidUrl { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- catalog [options]");
    eprintln!("  cargo run -p app -- walk <module-id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --assets <dir>        Directory holding data.json and style.html");
    eprintln!("  --store-url <url>     Base URL of the remote document store");
    eprintln!("  --auth-url <url>      Base URL of the identity provider");
    eprintln!("  --mode <mode>         Catalog sources: local, remote or both (default: remote)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_ASSETS_DIR, LEARN_STORE_URL, LEARN_AUTH_URL, LEARN_API_KEY,");
    eprintln!("  LEARN_VIDEO_HOST, LEARN_CATALOG_MODE, LEARN_EMAIL, LEARN_PASSWORD, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Catalog,
    Walk(ModuleId),
}

/// Flag overrides applied on top of the environment.
fn apply_flags(
    config: &mut AppConfig,
    args: &mut impl Iterator<Item = String>,
) -> Result<(), ArgsError> {
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assets" => {
                config.assets_dir = Some(PathBuf::from(require_value(args, "--assets")?));
            }
            "--store-url" => {
                let raw = require_value(args, "--store-url")?;
                config.store_url = Some(parse_url("--store-url", raw)?);
            }
            "--auth-url" => {
                let raw = require_value(args, "--auth-url")?;
                config.auth_url = Some(parse_url("--auth-url", raw)?);
            }
            "--mode" => {
                let raw = require_value(args, "--mode")?;
                config.catalog_mode = raw
                    .parse::<CatalogMode>()
                    .map_err(|_| ArgsError::InvalidMode { raw })?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(())
}

fn parse_command(argv: &mut Vec<String>) -> Result<Command, ArgsError> {
    match argv.first().map(String::as_str) {
        None => Ok(Command::Catalog),
        Some(first) if first.starts_with("--") => Ok(Command::Catalog),
        Some("catalog") => {
            argv.remove(0);
            Ok(Command::Catalog)
        }
        Some("walk") => {
            argv.remove(0);
            if argv.is_empty() || argv[0].starts_with("--") {
                return Err(ArgsError::MissingModuleId);
            }
            let raw = argv.remove(0);
            let id = ModuleId::new(raw.clone()).map_err(|_| ArgsError::InvalidModuleId { raw })?;
            Ok(Command::Walk(id))
        }
        Some(other) => Err(ArgsError::UnknownArg(other.to_owned())),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_catalog(host: &SessionHost) {
    let home = host.home();
    println!("{}", home.title);
    if let Some(resume) = &home.resume {
        println!("  Continue: {}", resume.title);
    }
    for card in &home.cards {
        let marker = match card.kind {
            ModuleCardKind::Lessons => "lessons",
            ModuleCardKind::Test => "test",
        };
        println!(
            "  [{}] {} ({marker}): {} | {}",
            card.module, card.title, card.count_label, card.time_label
        );
    }
}

async fn walk_lessons(host: &mut SessionHost, module: &ModuleId) -> Result<(), Box<dyn std::error::Error>> {
    if !host.open_lessons(module, 0).await? {
        println!("Module {module} has no lessons.");
        return Ok(());
    }
    while host.navigator().state() == NavState::LessonWalk {
        if let Some(lesson) = host.navigator().current_lesson() {
            println!("== {} ({})", lesson.title(), lesson.duration());
        }
        if let Some(video) = host.current_video_url() {
            println!("   video: {video}");
        }
        println!("{}\n", host.navigator().rendered_body().plain_text());
        host.navigator_mut().advance_lesson();
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let command = parse_command(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let mut config = AppConfig::from_env()?;
    apply_flags(&mut config, &mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging();

    let services = AppServices::from_config(&config);
    let app: Arc<dyn UiApp> = Arc::new(services);
    let mut host = SessionHost::new(build_app_context(&app));

    let modules = host.launch().await;
    info!(modules, "catalog ready");

    if let (Ok(email), Ok(password)) = (
        std::env::var("LEARN_EMAIL"),
        std::env::var("LEARN_PASSWORD"),
    ) {
        if !host.session().is_signed_in() {
            if let Err(err) = host.sign_in(&email, &password).await {
                eprintln!("{}", err.message());
            }
        }
    }

    match command {
        Command::Catalog => print_catalog(&host),
        Command::Walk(module) => {
            walk_lessons(&mut host, &module).await?;
            if host.session().is_signed_in() {
                host.record_progress(true).await?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn no_subcommand_lists_the_catalog() {
        let mut args = argv(&["--assets", "assets"]);
        assert_eq!(parse_command(&mut args).unwrap(), Command::Catalog);
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn walk_takes_a_module_id() {
        let mut args = argv(&["walk", "swift", "--mode", "local"]);
        assert_eq!(
            parse_command(&mut args).unwrap(),
            Command::Walk(ModuleId::new("swift").unwrap())
        );
        assert_eq!(args, argv(&["--mode", "local"]));

        let mut args = argv(&["walk", "--mode", "local"]);
        assert!(matches!(parse_command(&mut args), Err(ArgsError::MissingModuleId)));
    }

    #[test]
    fn flags_override_the_environment() {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        let mut args = argv(&[
            "--assets",
            "assets",
            "--store-url",
            "http://localhost:8080/v1/",
            "--mode",
            "both",
        ])
        .into_iter();
        apply_flags(&mut config, &mut args).unwrap();

        assert_eq!(config.assets_dir, Some(PathBuf::from("assets")));
        assert!(config.store_url.is_some());
        assert_eq!(config.catalog_mode, CatalogMode::LocalThenRemote);
    }

    #[test]
    fn bad_flags_are_reported() {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        let mut args = argv(&["--store-url", "nope"]).into_iter();
        assert!(matches!(
            apply_flags(&mut config, &mut args),
            Err(ArgsError::InvalidUrl { flag: "--store-url", .. })
        ));

        let mut args = argv(&["--mode", "sideways"]).into_iter();
        assert!(matches!(
            apply_flags(&mut config, &mut args),
            Err(ArgsError::InvalidMode { .. })
        ));
    }
}
