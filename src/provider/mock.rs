use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{sync::RwLock, time::sleep};
use tracing::debug;

use crate::{
    error::Error,
    model::{
        CategorySpend, DashboardSummary, Reference, TopCategory, Transaction,
        TransactionFilters, TransactionPatch,
    },
    provider::DataSource,
    types::HealthStatus,
};

/// Simulated round-trip times of the fixture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub read: Duration,
    pub write: Duration,
    pub health: Duration,
}

impl Latency {
    pub const NONE: Latency = Latency {
        read: Duration::ZERO,
        write: Duration::ZERO,
        health: Duration::ZERO,
    };
}

impl Default for Latency {
    fn default() -> Self {
        Latency {
            read: Duration::from_millis(400),
            write: Duration::from_millis(200),
            health: Duration::from_millis(600),
        }
    }
}

/// In-memory fixture backend. Every instance owns its own fixtures.
#[derive(Debug)]
pub struct Mock {
    latency: Latency,
    dashboard: DashboardSummary,
    transactions: RwLock<Vec<Transaction>>,
}

impl Mock {
    pub fn new() -> Self {
        Mock::with_anchor(Utc::now(), Latency::default())
    }

    /// Fixture transactions are all dated `anchor`.
    pub fn with_anchor(anchor: DateTime<Utc>, latency: Latency) -> Self {
        Mock {
            latency,
            dashboard: fixture_dashboard(),
            transactions: RwLock::new(fixture_transactions(anchor)),
        }
    }

    pub async fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.read().await.clone()
    }

    async fn delay(duration: Duration) {
        if !duration.is_zero() {
            sleep(duration).await;
        }
    }
}

impl Default for Mock {
    fn default() -> Self {
        Mock::new()
    }
}

#[async_trait]
impl DataSource for Mock {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn dashboard_summary(
        &self,
        month: &str,
    ) -> Result<DashboardSummary, Error> {
        debug!("Mock dashboard summary for {}", month);
        Mock::delay(self.latency.read).await;
        Ok(self.dashboard.clone())
    }

    async fn transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, Error> {
        debug!("Mock transactions for {:?}", filters);
        Mock::delay(self.latency.read).await;
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|transaction| filters.matches(transaction))
            .cloned()
            .collect())
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        Mock::delay(self.latency.write).await;
        let mut transactions = self.transactions.write().await;
        match transactions.iter_mut().find(|item| item.id == id) {
            Some(transaction) => {
                transaction.apply(patch.clone());
                Ok(transaction.clone())
            },
            None => Err(Error::NotFound(format!(
                "Transacción no encontrada: {}",
                id
            ))),
        }
    }

    async fn health(&self) -> Result<HealthStatus, Error> {
        Mock::delay(self.latency.health).await;
        Ok(HealthStatus::ok())
    }
}

fn fixture_dashboard() -> DashboardSummary {
    let spend = |category: &str, amount: i64, color: &str| CategorySpend {
        category: category.to_owned(),
        amount,
        color: color.to_owned(),
    };
    let top = |id: &str, name: &str, amount: i64, percent_of_total: f64| {
        TopCategory {
            id: id.to_owned(),
            name: name.to_owned(),
            amount,
            percent_of_total,
        }
    };

    DashboardSummary {
        total_spent: 450000,
        balance: 150000,
        budget_usage_percent: 0.75,
        spending_by_category: vec![
            spend("Comida", 150000, "#3b82f6"),
            spend("Transporte", 80000, "#10b981"),
            spend("Cuentas", 120000, "#f97316"),
            spend("Ocio", 100000, "#ec4899"),
        ],
        top_categories: vec![
            top("1", "Comida", 150000, 0.33),
            top("2", "Cuentas", 120000, 0.26),
            top("3", "Ocio", 100000, 0.22),
        ],
    }
}

fn fixture_transactions(anchor: DateTime<Utc>) -> Vec<Transaction> {
    let checking = Reference::new("a1", "Cuenta Corriente");
    let cash_account = Reference::new("a2", "Efectivo");
    let debit = Reference::new("p1", "Débito");
    let cash = Reference::new("p2", "Efectivo");

    vec![
        Transaction {
            id: String::from("t1"),
            date: anchor,
            description: String::from("Supermercado Lider"),
            amount: 75000,
            category: Reference::new("c1", "Comida"),
            account: checking.clone(),
            payment_method: debit.clone(),
        },
        Transaction {
            id: String::from("t2"),
            date: anchor,
            description: String::from("Pago CGE"),
            amount: 45000,
            category: Reference::new("c2", "Cuentas"),
            account: checking,
            payment_method: debit,
        },
        Transaction {
            id: String::from("t3"),
            date: anchor,
            description: String::from("Carga Bip!"),
            amount: 10000,
            category: Reference::new("c3", "Transporte"),
            account: cash_account,
            payment_method: cash,
        },
    ]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn mock() -> Mock {
        let anchor = Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap();
        Mock::with_anchor(anchor, Latency::NONE)
    }

    #[tokio::test]
    async fn test_fixtures_are_deterministic_regardless_of_call_order() {
        let first = mock();
        let second = mock();
        let filters = TransactionFilters::for_month("2024-05");

        let a_transactions = first.transactions(&filters).await.unwrap();
        let a_dashboard = first.dashboard_summary("2024-05").await.unwrap();

        let b_dashboard = second.dashboard_summary("1999-01").await.unwrap();
        let b_transactions = second.transactions(&filters).await.unwrap();

        assert_eq!(a_dashboard, b_dashboard);
        assert_eq!(a_transactions, b_transactions);
        assert_eq!(a_transactions.len(), 3);
        assert_eq!(a_dashboard.total_spent, 450000);
    }

    #[tokio::test]
    async fn test_filters_by_category_and_account() {
        let mock = mock();
        let mut filters = TransactionFilters::for_month("2024-05");
        filters.account = Some(String::from("a1"));

        let ids: Vec<String> = mock
            .transactions(&filters)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);

        filters.category = Some(String::from("c2"));
        let items = mock.transactions(&filters).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "t2");
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let mock = mock();
        let patch = TransactionPatch {
            description: Some(String::from("Supermercado Jumbo")),
            category: Some(Reference::new("c3", "Transporte")),
            ..Default::default()
        };

        let updated = mock.update_transaction("t1", &patch).await.unwrap();
        assert_eq!(updated.description, "Supermercado Jumbo");
        assert_eq!(updated.category.id, "c3");
        assert_eq!(updated.amount, 75000);
        assert_eq!(mock.snapshot().await[0], updated);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found_and_keeps_fixtures() {
        let mock = mock();
        let before = mock.snapshot().await;
        let patch = TransactionPatch {
            amount: Some(1),
            ..Default::default()
        };

        let result = mock.update_transaction("t404", &patch).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(mock.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_simulated_read_latency() {
        let latency = Latency {
            read: Duration::from_millis(40),
            ..Latency::NONE
        };
        let mock = Mock::with_anchor(Utc::now(), latency);

        let started = std::time::Instant::now();
        mock.dashboard_summary("2024-05").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
