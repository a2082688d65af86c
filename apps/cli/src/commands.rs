//! Subcommand implementations. Each returns the rendered output.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use serde_json::json;
use tokio::task::JoinHandle;

use fxlens_detect::{DetectionReport, MentionDetector, NumberParser, SymbolTable};
use fxlens_rates::{
    default_providers, ConversionEngine, ConversionResult, CredentialLookup,
    EnvCredentialLookup, ProviderOrchestrator, RateCache, RateError,
};

use crate::config::Config;
use crate::store::JsonFileStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Rate resolution wired to the environment, with the cache persisted in
/// a JSON file between runs.
pub struct RateServices {
    pub engine: ConversionEngine,
    cache: Arc<RateCache>,
    store: JsonFileStore,
    sweeper: JoinHandle<()>,
}

impl RateServices {
    pub async fn start(config: &Config) -> Self {
        let cache = Arc::new(RateCache::new(config.cache.clone()));
        let store = JsonFileStore::new(config.cache_file.clone());
        match cache.restore(&store).await {
            Ok(restored) => tracing::debug!(
                "Restored {} rates from {}",
                restored,
                config.cache_file.display()
            ),
            Err(e) => tracing::warn!("Could not read rate cache: {}", e),
        }
        let sweeper = cache.spawn_expiry_sweeper(SWEEP_INTERVAL);

        let credentials: Arc<dyn CredentialLookup> = Arc::new(EnvCredentialLookup);
        let orchestrator = ProviderOrchestrator::with_config(
            default_providers(credentials),
            cache.clone(),
            config.orchestrator_config(),
        );

        Self {
            engine: ConversionEngine::new(Arc::new(orchestrator)),
            cache,
            store,
            sweeper,
        }
    }

    pub async fn shutdown(self) {
        self.sweeper.abort();
        self.cache.evict_expired();
        if let Err(e) = self.cache.persist(&self.store).await {
            tracing::warn!("Could not save rate cache: {}", e);
        }
    }
}

/// Accept a code, symbol or currency name (`usd`, `€`, `yen`).
pub fn resolve_currency(input: &str) -> String {
    SymbolTable::symbol_or_word_to_currency(input)
        .map(str::to_string)
        .unwrap_or_else(|| input.trim().to_uppercase())
}

pub fn detect(detector: &MentionDetector, text: &str, format: OutputFormat) -> anyhow::Result<String> {
    let report = detector.scan(text);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => Ok(render_report(&report)),
    }
}

pub async fn convert(
    engine: &ConversionEngine,
    amount: &str,
    from: &str,
    targets: &[String],
    format: OutputFormat,
) -> anyhow::Result<String> {
    let amount = NumberParser::parse(amount)
        .with_context(|| format!("'{}' is not an amount", amount))?;
    let from = resolve_currency(from);
    let targets: Vec<String> = targets.iter().map(|t| resolve_currency(t)).collect();
    let target_refs: Vec<&str> = targets.iter().map(String::as_str).collect();

    let results = engine.convert_many(amount, &from, &target_refs).await;
    Ok(render_conversions(&targets, &results, format))
}

pub async fn scan(
    detector: &MentionDetector,
    engine: &ConversionEngine,
    text: &str,
    targets: &[String],
    format: OutputFormat,
) -> anyhow::Result<String> {
    let report = detector.scan(text);
    let targets: Vec<String> = targets.iter().map(|t| resolve_currency(t)).collect();

    let mut sections = Vec::with_capacity(report.mentions.len());
    let mut values = Vec::with_capacity(report.mentions.len());
    for mention in &report.mentions {
        let wanted: Vec<&str> = targets
            .iter()
            .map(String::as_str)
            .filter(|t| *t != mention.currency_code)
            .collect();
        let results = engine
            .convert_many(mention.amount, &mention.currency_code, &wanted)
            .await;
        let wanted: Vec<String> = wanted.iter().map(|t| t.to_string()).collect();

        match format {
            OutputFormat::Text => sections.push(format!(
                "{} ({} {})\n{}",
                mention.source_text,
                mention.amount,
                mention.currency_code,
                indent(&render_conversions(&wanted, &results, OutputFormat::Text))
            )),
            OutputFormat::Json => values.push(json!({
                "mention": mention,
                "conversions": conversions_json(&wanted, &results),
            })),
        }
    }

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "multipleMentions": report.multiple_mentions,
            "results": values,
        }))?),
        OutputFormat::Text if sections.is_empty() => Ok("No currency amounts found.".to_string()),
        OutputFormat::Text => Ok(sections.join("\n")),
    }
}

fn render_report(report: &DetectionReport) -> String {
    if report.is_empty() {
        return "No currency amounts found.".to_string();
    }
    report
        .mentions
        .iter()
        .map(|m| {
            format!(
                "{}  =>  {} {}  [{}, confidence {:.2}, bytes {}..{}]",
                m.source_text,
                m.amount,
                m.currency_code,
                m.format,
                m.confidence,
                m.start(),
                m.end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_conversions(
    targets: &[String],
    results: &[Result<ConversionResult, RateError>],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&conversions_json(targets, results))
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputFormat::Text => targets
            .iter()
            .zip(results)
            .map(|(to, result)| match result {
                Ok(r) => render_conversion(r),
                Err(e) => format!("{}: {}", to, describe_error(e)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_conversion(result: &ConversionResult) -> String {
    let mut flags = vec![format!("rate {}", result.rate), result.source.clone()];
    if result.cached {
        flags.push("cached".to_string());
    }
    if result.offline {
        flags.push("offline".to_string());
    }
    format!(
        "{} {} = {} {}  ({})",
        result.original_amount,
        result.from_currency,
        result.converted_amount,
        result.to_currency,
        flags.join(", ")
    )
}

fn conversions_json(
    targets: &[String],
    results: &[Result<ConversionResult, RateError>],
) -> serde_json::Value {
    let items: Vec<serde_json::Value> = targets
        .iter()
        .zip(results)
        .map(|(to, result)| match result {
            Ok(r) => json!(r),
            Err(RateError::AllProvidersExhausted { attempts, .. }) => json!({
                "toCurrency": to,
                "error": result.as_ref().err().map(|e| e.to_string()),
                "attempts": attempts,
            }),
            Err(e) => json!({ "toCurrency": to, "error": e.to_string() }),
        })
        .collect();
    serde_json::Value::Array(items)
}

fn describe_error(error: &RateError) -> String {
    match error {
        RateError::AllProvidersExhausted { pair, attempts } if !attempts.is_empty() => {
            let tried: Vec<String> = attempts
                .iter()
                .map(|a| format!("{} ({})", a.provider, a.error))
                .collect();
            format!("no rate for {}; tried {}", pair, tried.join(", "))
        }
        other => other.to_string(),
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
