//! Autofill agent: runs the background and page components against a local
//! HTML page and prints what got filled.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formfill::autofill::MemoryDocument;
use formfill::config::AgentConfig;
use formfill::messaging::{self, BackendClient, BackgroundWorker, ContentWorker, Request, Response};
use formfill::scanning::scrape::classify_snapshot;
use formfill::scanning::FieldClassifier;

#[derive(Parser)]
#[command(name = "formfill-agent")]
#[command(about = "Autofill a local HTML form from the latest parsed resume")]
struct Args {
    /// HTML page to fill
    page: PathBuf,

    /// Ask the backend to scrape this URL for selectors instead of scanning
    /// the local page
    #[arg(short, long)]
    url: Option<String>,

    /// Override the observation window, in seconds
    #[arg(short, long)]
    window_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AgentConfig::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("formfill={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let document = Arc::new(
        MemoryDocument::from_path(&args.page)
            .with_context(|| format!("Failed to read {}", args.page.display()))?,
    );

    let backend = BackendClient::new(&config.backend_url, config.request_timeout())
        .context("Failed to build backend client")?;
    let (background, background_inbox) = messaging::channel(16);
    tokio::spawn(BackgroundWorker::new(backend).run(background_inbox));

    let window = args
        .window_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.observation_window());
    let (reports_tx, mut reports_rx) = mpsc::channel(1);
    let (content, content_inbox) = messaging::channel(16);
    tokio::spawn(
        ContentWorker::new(Arc::clone(&document), background.clone())
            .with_window(window)
            .with_report_sink(reports_tx)
            .run(content_inbox),
    );

    let fields = match &args.url {
        Some(url) => scraped_fields(&background, url).await?,
        None => classify_snapshot(&FieldClassifier::default(), &document.html())
            .into_iter()
            .map(|(category, selector)| (category.key().to_string(), selector))
            .collect(),
    };
    info!("Autofilling {} field(s)", fields.len());

    let selectors = fields.clone();
    let response = content.send(Request::DynamicAutofill { fields }).await?;
    if let Response::Error { error } = &response {
        bail!("Autofill failed: {error}");
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    info!("Observing for {}s", window.as_secs());
    let report = reports_rx
        .recv()
        .await
        .ok_or_else(|| anyhow!("Autofill run ended without a report"))?;

    // Values as seen through each category's primary selector.
    let values: BTreeMap<&str, Option<String>> = report
        .filled
        .iter()
        .map(|category| {
            let value = selectors
                .get(category.key())
                .and_then(|selector| document.value_of(selector));
            (category.key(), value)
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "report": report, "values": values }))?
    );

    Ok(())
}

async fn scraped_fields(
    background: &messaging::MessageSender,
    url: &str,
) -> Result<BTreeMap<String, String>> {
    let response = background
        .send(Request::ScrapeFields {
            url: url.to_string(),
        })
        .await?;
    let data = match response {
        Response::Data { data } => data,
        Response::Error { error } => bail!("Scrape failed: {error}"),
        other => bail!("Unexpected scrape response: {other:?}"),
    };
    let fields = match data.get("fields") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    };
    Ok(fields)
}
