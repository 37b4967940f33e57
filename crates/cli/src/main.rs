// ABOUTME: CLI for scraping Flipkart and Amazon product pages with pricetag-scout.
// ABOUTME: Scrapes live URLs or a saved HTML file and prints the extracted fields as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pricetag_scout::{load_catalog_file, Client, PlatformId, ScrapeResult};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Extract title, price, MRP, discount and image from product pages.
#[derive(Parser, Debug)]
#[command(name = "pricetag")]
#[command(about = "Scrape product pages and print extracted fields as JSON", long_about = None)]
struct Args {
    /// Product page URLs to fetch.
    #[arg()]
    urls: Vec<String>,

    /// Saved HTML file to extract from instead of fetching.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Page URL for --html; selects the platform unless --platform is given.
    #[arg(long)]
    url: Option<String>,

    /// Force the platform for --html (flipkart or amazon).
    #[arg(long)]
    platform: Option<PlatformId>,

    /// Selector catalog file replacing the built-in one.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        match &self.html {
            Some(_) if !self.urls.is_empty() => {
                bail!("cannot use both --html and positional URLs")
            }
            Some(_) if self.url.is_none() && self.platform.is_none() => {
                bail!("--html requires --url or --platform")
            }
            None if self.urls.is_empty() => {
                bail!("at least one URL is required, or use --html")
            }
            None if self.platform.is_some() => {
                bail!("--platform only applies with --html")
            }
            _ => Ok(()),
        }
    }
}

fn build_client(args: &Args) -> Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(args.timeout.max(1)));
    if let Some(path) = &args.catalog {
        let catalog = load_catalog_file(path)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        builder = builder.catalog(catalog);
    }
    Ok(builder.build()?)
}

fn scrape_file(client: &Client, args: &Args, path: &Path) -> Result<ScrapeResult> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let result = match (args.platform, &args.url) {
        (Some(platform), url) => {
            let mut result = client.scrape_html_as(&html, platform)?;
            if let Some(url) = url {
                result.url = url.clone();
            }
            result
        }
        (None, Some(url)) => client.scrape_html(&html, url)?,
        (None, None) => bail!("--html requires --url or --platform"),
    };
    Ok(result)
}

fn entry(target: &str, outcome: Result<ScrapeResult, String>) -> (bool, Value) {
    match outcome {
        Ok(result) => (true, serde_json::to_value(&result).unwrap_or(Value::Null)),
        Err(error) => (false, json!({ "url": target, "error": error })),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

/// Returns whether every target succeeded.
async fn run(args: Args) -> Result<bool> {
    args.validate()?;
    let client = build_client(&args)?;

    let mut results = Vec::new();
    if let Some(path) = &args.html {
        let target = args
            .url
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        let outcome = scrape_file(&client, &args, path).map_err(|e| format!("{e:#}"));
        results.push(entry(&target, outcome));
    } else {
        for url in &args.urls {
            let outcome = client.scrape(url).await.map_err(|e| e.to_string());
            results.push(entry(url, outcome));
        }
    }

    let scraped = results.iter().filter(|(ok, _)| *ok).count();
    let failed = results.len() - scraped;

    // A single success prints the bare result; anything else gets the envelope.
    let output = match results.as_slice() {
        [(true, value)] => value.clone(),
        _ => json!({
            "results": results.iter().map(|(_, v)| v).collect::<Vec<_>>(),
            "total": results.len(),
            "scraped": scraped,
            "failed": failed,
        }),
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(failed == 0)
}
