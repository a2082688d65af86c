//! Static provider configuration.

use serde::Serialize;

/// Static facts about a rate provider.
///
/// Lower `priority` values are tried first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub base_endpoint: &'static str,
    pub priority: u8,
    pub requires_credential: bool,
}

/// The built-in providers, in cascade order.
pub const PROVIDER_TABLE: [ProviderDescriptor; 4] = [
    crate::provider::frankfurter::DESCRIPTOR,
    crate::provider::exchange_rate_api::DESCRIPTOR,
    crate::provider::open_exchange_rates::DESCRIPTOR,
    crate::provider::coingecko::DESCRIPTOR,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_in_priority_order() {
        let priorities: Vec<u8> = PROVIDER_TABLE.iter().map(|d| d.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in PROVIDER_TABLE.iter().enumerate() {
            for b in &PROVIDER_TABLE[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
