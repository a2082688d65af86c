mod commands;
mod config;
mod store;

use std::io::Read;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{OutputFormat, RateServices};
use config::Config;
use fxlens_detect::MentionDetector;

#[derive(Parser, Debug)]
#[command(name = "fxlens", version, about = "Find money amounts in text and convert them")]
struct Cli {
    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the currency amounts found in TEXT (read from stdin when omitted)
    Detect { text: Option<String> },

    /// Convert AMOUNT of FROM into one or more currencies
    Convert {
        /// Amount in any supported notation (`1,234.56`, `1.234,56`, ...)
        amount: String,
        /// Source currency code, symbol or name
        from: String,
        /// Target currencies, defaults to FXLENS_BASE_CURRENCY
        #[arg(value_delimiter = ',')]
        to: Vec<String>,
    },

    /// Detect amounts in TEXT and convert each of them
    Scan {
        /// Comma separated target currencies, defaults to FXLENS_BASE_CURRENCY
        #[arg(long, short, value_delimiter = ',')]
        to: Vec<String>,
        text: Option<String>,
    },
}

pub fn init_tracing() {
    let log_format = std::env::var("FXLENS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn read_input(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn targets_or_base(targets: Vec<String>, config: &Config) -> Vec<String> {
    if targets.is_empty() {
        vec![config.base_currency.clone()]
    } else {
        targets
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();
    let detector = MentionDetector::with_config(config.detector_config());

    let output = match cli.command {
        Command::Detect { text } => commands::detect(&detector, &read_input(text)?, cli.output)?,
        Command::Convert { amount, from, to } => {
            let targets = targets_or_base(to, &config);
            let services = RateServices::start(&config).await;
            let output =
                commands::convert(&services.engine, &amount, &from, &targets, cli.output).await;
            services.shutdown().await;
            output?
        }
        Command::Scan { to, text } => {
            let text = read_input(text)?;
            let targets = targets_or_base(to, &config);
            let services = RateServices::start(&config).await;
            let output =
                commands::scan(&detector, &services.engine, &text, &targets, cli.output).await;
            services.shutdown().await;
            output?
        }
    };

    println!("{}", output);
    Ok(())
}
