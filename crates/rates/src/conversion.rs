//! Amount conversion on top of the provider orchestrator.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use fxlens_detect::{CurrencyMention, SymbolTable};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::RateError;
use crate::models::{ConversionRequest, ConversionResult, RateRecord};
use crate::orchestrator::ProviderOrchestrator;

/// Crypto targets never get more places than this.
const MAX_CRYPTO_PRECISION: u32 = 8;

/// Decimal places for a converted value.
///
/// The tier follows the magnitude of the result: `>= 1000` gets 2 places,
/// `>= 1` gets 3, anything smaller 4. Crypto targets keep up to
/// [`MAX_CRYPTO_PRECISION`] places of the asset's own precision.
pub fn precision_for(converted: Decimal, to_currency: &str) -> u32 {
    let magnitude = converted.abs();
    let tier = if magnitude >= Decimal::ONE_THOUSAND {
        2
    } else if magnitude >= Decimal::ONE {
        3
    } else {
        4
    };

    match SymbolTable::crypto_asset(to_currency) {
        Some(asset) => tier.max(asset.decimals.min(MAX_CRYPTO_PRECISION)),
        None => tier,
    }
}

/// Converts amounts using rates resolved by a [`ProviderOrchestrator`].
pub struct ConversionEngine {
    orchestrator: Arc<ProviderOrchestrator>,
}

impl ConversionEngine {
    pub fn new(orchestrator: Arc<ProviderOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<ProviderOrchestrator> {
        &self.orchestrator
    }

    /// Convert `amount` of `from` into `to`.
    ///
    /// Fails with `InvalidInput` before any network call if the amount is
    /// not positive or either code is missing or malformed.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<ConversionResult, RateError> {
        if amount <= Decimal::ZERO {
            return Err(RateError::InvalidInput(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let record = self.orchestrator.get_rate(from, to).await?;
        build_result(amount, &record)
    }

    pub async fn convert_request(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, RateError> {
        self.convert(request.amount, &request.from_currency, &request.to_currency)
            .await
    }

    /// Convert a detected mention into `to`.
    pub async fn convert_mention(
        &self,
        mention: &CurrencyMention,
        to: &str,
    ) -> Result<ConversionResult, RateError> {
        self.convert(mention.amount, &mention.currency_code, to).await
    }

    /// Convert into several targets concurrently. Results keep the order of
    /// `targets`; one failing target does not affect the others.
    pub async fn convert_many(
        &self,
        amount: Decimal,
        from: &str,
        targets: &[&str],
    ) -> Vec<Result<ConversionResult, RateError>> {
        debug!("Converting {} {} into {} targets", amount, from, targets.len());
        join_all(targets.iter().map(|to| self.convert(amount, from, to))).await
    }
}

fn build_result(amount: Decimal, record: &RateRecord) -> Result<ConversionResult, RateError> {
    let raw = amount.checked_mul(record.rate).ok_or_else(|| {
        RateError::InvalidInput(format!(
            "{} {} is too large to convert at rate {}",
            amount, record.from_currency, record.rate
        ))
    })?;
    let precision = precision_for(raw, &record.to_currency);
    let converted_amount = raw
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    Ok(ConversionResult {
        original_amount: amount,
        from_currency: record.from_currency.clone(),
        to_currency: record.to_currency.clone(),
        converted_amount,
        rate: record.rate,
        precision,
        source: record.source.clone(),
        cached: record.cached,
        offline: record.offline,
        timestamp: Utc::now(),
    })
}
