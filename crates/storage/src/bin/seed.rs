use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use storage::http::HttpDocumentStore;
use storage::identity::CredentialSource;
use storage::mapping::{decode_seed_bundle, seed_documents};
use storage::repository::DocumentStore;
use url::Url;

#[derive(Debug, Clone)]
struct Args {
    bundle: PathBuf,
    store_url: Url,
    token: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStoreUrl { raw: String },
    MissingStoreUrl,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStoreUrl { raw } => write!(f, "invalid --store-url value: {raw}"),
            ArgsError::MissingStoreUrl => write!(f, "--store-url (or LEARN_STORE_URL) is required"),
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

fn parse_url(raw: String) -> Result<Url, ArgsError> {
    Url::parse(&raw).map_err(|_| ArgsError::InvalidStoreUrl { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut bundle = std::env::var("LEARN_SEED_BUNDLE")
            .map_or_else(|_| PathBuf::from("assets/data.json"), PathBuf::from);
        let mut store_url = std::env::var("LEARN_STORE_URL").ok().map(parse_url).transpose()?;
        let mut token = std::env::var("LEARN_STORE_TOKEN").ok();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bundle" => {
                    bundle = PathBuf::from(require_value(&mut args, "--bundle")?);
                }
                "--store-url" => {
                    store_url = Some(parse_url(require_value(&mut args, "--store-url")?)?);
                }
                "--token" => {
                    token = Some(require_value(&mut args, "--token")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bundle,
            store_url: store_url.ok_or(ArgsError::MissingStoreUrl)?,
            token,
        })
    }
}

struct StaticToken(String);

impl CredentialSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --bundle <path>       Content bundle with nested lessons/questions (default: assets/data.json)");
    eprintln!("  --store-url <url>     Base URL of the remote document store");
    eprintln!("  --token <token>       Bearer token for writes");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LEARN_SEED_BUNDLE, LEARN_STORE_URL, LEARN_STORE_TOKEN");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bytes = std::fs::read(&args.bundle)?;
    let name = args.bundle.display().to_string();
    let seeded = decode_seed_bundle(&name, &bytes)?;

    let mut store = HttpDocumentStore::new(args.store_url.clone());
    if let Some(token) = args.token {
        store = store.with_credentials(Arc::new(StaticToken(token)));
    }

    for (path, fields) in seed_documents(&seeded) {
        store.merge(&path, fields).await?;
    }
    let lesson_count: usize = seeded.iter().map(|entry| entry.lessons.len()).sum();
    let question_count: usize = seeded.iter().map(|entry| entry.questions.len()).sum();

    println!(
        "Seeded {} modules, {} lessons and {} questions into {}",
        seeded.len(),
        lesson_count,
        question_count,
        args.store_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
