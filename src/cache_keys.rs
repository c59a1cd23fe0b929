//! Query key families and key builders
//!
//! Every cached query is indexed by a `QueryKey` built here so that
//! invalidation prefixes and lookups cannot drift apart.

use std::fmt;

use crate::model::TransactionFilters;

pub const DASHBOARD: &str = "dashboard";
pub const TRANSACTIONS: &str = "transactions";
pub const HEALTH_CHECK: &str = "healthCheck";

/// Composite cache key: a query kind followed by its parameters.
/// Two keys are equal iff every segment matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(kind: &str) -> Self {
        QueryKey(vec![kind.to_owned()])
    }

    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn kind(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("_"))
    }
}

pub fn dashboard(month: &str) -> QueryKey {
    QueryKey::new(DASHBOARD).with(month)
}

pub fn transactions(filters: &TransactionFilters) -> QueryKey {
    filters
        .query_pairs()
        .into_iter()
        .fold(QueryKey::new(TRANSACTIONS), |key, (name, value)| {
            key.with(format!("{}={}", name, value))
        })
}

pub fn health_check() -> QueryKey {
    QueryKey::new(HEALTH_CHECK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_equal_iff_all_params_match() {
        let mut filters = TransactionFilters::for_month("2024-05");
        let plain = transactions(&filters);
        assert_eq!(plain, transactions(&filters));

        filters.category = Some(String::from("c1"));
        assert_ne!(plain, transactions(&filters));
        assert_eq!(
            transactions(&filters).to_string(),
            "transactions_month=2024-05_category=c1"
        );
        assert_ne!(dashboard("2024-05"), dashboard("2024-06"));
    }

    #[test]
    fn test_prefix_match() {
        let family = QueryKey::new(DASHBOARD);
        assert!(dashboard("2024-05").starts_with(&family));
        assert!(!dashboard("2024-05").starts_with(&QueryKey::new(TRANSACTIONS)));
        assert!(!family.starts_with(&dashboard("2024-05")));
        assert_eq!(dashboard("2024-05").kind(), DASHBOARD);
    }
}
