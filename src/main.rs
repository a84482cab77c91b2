//! mailtone - Entry point for the sentiment-labeling pipeline

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use mailtone::config::Settings;
use mailtone::listener::{Listener, PubSubSource};
use mailtone::providers::classifier;
use mailtone::providers::mail::{GmailProvider, GoogleCredentials, TokenSource};
use mailtone::services::{
    AggregatorService, LabelService, MetricsService, PipelineService, ResolverService,
};
use mailtone::storage::{Database, SqliteMetricsStorage};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let stats_only = args.iter().any(|a| a == "--stats");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .or_else(|| std::env::var("MAILTONE_CONFIG").ok())
        .unwrap_or_else(|| "mailtone.json".to_string());

    let settings = if Path::new(&config_path).exists() {
        Settings::load(&config_path).with_context(|| format!("loading {}", config_path))?
    } else {
        tracing::info!(path = %config_path, "no config file found, using defaults");
        Settings::default()
    };
    settings.validate()?;

    let db = Database::open(&settings.metrics.db_path)
        .await
        .with_context(|| format!("opening {}", settings.metrics.db_path.display()))?;
    let metrics = MetricsService::new(SqliteMetricsStorage::new(db));

    if stats_only {
        let counts = metrics.aggregate().await?;
        print!("{}", MetricsService::<SqliteMetricsStorage>::format_report(&counts));
        return Ok(());
    }

    let credentials = GoogleCredentials::from_file(&settings.gmail.credentials_path)?;
    let client = reqwest::Client::builder()
        .timeout(settings.gmail.timeout())
        .build()
        .context("building HTTP client")?;
    let tokens = Arc::new(TokenSource::new(credentials, client.clone()));
    let provider = Arc::new(GmailProvider::new(client.clone(), Arc::clone(&tokens)));

    if let Some(topic) = &settings.gmail.watch_topic {
        // Non-fatal: an expired watch only delays notifications until the
        // next renewal.
        if let Err(e) = provider.watch_inbox(topic).await {
            tracing::warn!(topic = %topic, error = %e, "failed to renew inbox watch");
        }
    }

    if settings.subscription.subscription.is_empty() {
        anyhow::bail!("no Pub/Sub subscription configured");
    }

    let backend = classifier::build(&settings.classifier)?;
    tracing::info!(backend = backend.name(), "starting mailtone");

    let pipeline = Arc::new(PipelineService::new(
        Arc::clone(&provider),
        ResolverService::new(Arc::clone(&provider)),
        AggregatorService::new(backend, settings.aggregation.clone()),
        LabelService::new(Arc::clone(&provider), settings.labels.clone()),
        metrics,
        settings.signals.clone(),
    ));

    let source = PubSubSource::new(client, tokens, settings.subscription.clone());
    let listener = Arc::new(Listener::new(pipeline, source));

    let stopper = Arc::clone(&listener);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            stopper.stop();
        }
    });

    listener.run().await;
    Ok(())
}
