//! Domain models exchanged with the finance API.

mod dashboard;
mod transaction;

pub use dashboard::{CategorySpend, DashboardSummary, TopCategory};
pub use transaction::{
    Reference, Transaction, TransactionFilters, TransactionPatch,
};
