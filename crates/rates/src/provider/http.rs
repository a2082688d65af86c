//! Shared HTTP plumbing for the built-in providers.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::errors::RateError;
use crate::models::CurrencyPair;

/// Per-request timeout for provider calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of an error body kept in an error message.
const MAX_BODY_IN_ERROR: usize = 200;

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` and return the body of a successful response.
///
/// Non-success statuses are mapped by [`status_error`].
pub(crate) async fn get_text(
    client: &Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, &str)],
    pair: &CurrencyPair,
) -> Result<String, RateError> {
    debug!("{} request for {} with {} params", provider, pair, query.len());

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(provider, status, pair, &body));
    }

    response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))
}

fn transport_error(provider: &str, e: reqwest::Error) -> RateError {
    if e.is_timeout() {
        RateError::Timeout {
            provider: provider.to_string(),
        }
    } else if e.is_connect() || e.is_request() {
        RateError::ProviderUnavailable {
            provider: provider.to_string(),
            message: format!("Request failed: {}", e),
        }
    } else {
        RateError::Network(e)
    }
}

/// Map a non-success HTTP status to an error.
pub(crate) fn status_error(
    provider: &str,
    status: StatusCode,
    pair: &CurrencyPair,
    body: &str,
) -> RateError {
    let provider = provider.to_string();
    match status {
        StatusCode::TOO_MANY_REQUESTS => RateError::RateLimited { provider },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RateError::ProviderRejected {
            provider,
            message: format!("HTTP {} - authorization failed", status.as_u16()),
        },
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => RateError::UnsupportedPair {
            provider,
            pair: pair.to_string(),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RateError::Timeout { provider }
        }
        s if s.is_server_error() => RateError::ProviderUnavailable {
            provider,
            message: format!("HTTP {}", s.as_u16()),
        },
        s => RateError::ProviderRejected {
            provider,
            message: format!("HTTP {} - {}", s.as_u16(), truncate(body)),
        },
    }
}

/// Deserialize a provider response body.
pub(crate) fn parse_json<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, RateError> {
    serde_json::from_str(body).map_err(|e| RateError::InvalidRate {
        provider: provider.to_string(),
        message: format!("Malformed response: {}", e),
    })
}

/// Convert a JSON float into a decimal rate.
pub(crate) fn to_decimal(provider: &str, value: f64) -> Result<Decimal, RateError> {
    Decimal::try_from(value).map_err(|_| RateError::InvalidRate {
        provider: provider.to_string(),
        message: format!("Rate {} is not representable", value),
    })
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_BODY_IN_ERROR) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RetryClass;

    fn pair() -> CurrencyPair {
        CurrencyPair::new("EUR", "USD")
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (StatusCode::TOO_MANY_REQUESTS, RetryClass::WithBackoff),
            (StatusCode::UNAUTHORIZED, RetryClass::NextProvider),
            (StatusCode::FORBIDDEN, RetryClass::NextProvider),
            (StatusCode::NOT_FOUND, RetryClass::NextProvider),
            (StatusCode::UNPROCESSABLE_ENTITY, RetryClass::NextProvider),
            (StatusCode::GATEWAY_TIMEOUT, RetryClass::WithBackoff),
            (StatusCode::SERVICE_UNAVAILABLE, RetryClass::WithBackoff),
            (StatusCode::BAD_REQUEST, RetryClass::NextProvider),
        ];
        for (status, expected) in cases {
            let err = status_error("TEST", status, &pair(), "");
            assert_eq!(err.retry_class(), expected, "{status}");
            assert_eq!(err.provider(), Some("TEST"));
        }
    }

    #[test]
    fn test_not_found_names_the_pair() {
        let err = status_error("TEST", StatusCode::NOT_FOUND, &pair(), "");
        assert!(matches!(err, RateError::UnsupportedPair { ref pair, .. } if pair == "EUR/USD"));
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = status_error("TEST", StatusCode::BAD_REQUEST, &pair(), &body);
        assert!(err.to_string().len() < 300);
    }

    #[test]
    fn test_malformed_json_is_invalid_rate() {
        let err = parse_json::<serde_json::Value>("TEST", "<html>").unwrap_err();
        assert!(matches!(err, RateError::InvalidRate { .. }));
    }

    #[test]
    fn test_unclassified_transport_error_is_network() {
        let e = Client::new().get("http://").build().unwrap_err();
        let err = transport_error("TEST", e);
        assert!(matches!(err, RateError::Network(_)));
        assert_eq!(err.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(
            to_decimal("TEST", 1.085).unwrap(),
            Decimal::new(1085, 3)
        );
        assert!(to_decimal("TEST", f64::NAN).is_err());
    }
}
