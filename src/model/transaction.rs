use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
}

impl Reference {
    pub fn new(id: &str, name: &str) -> Self {
        Reference {
            id: id.to_owned(),
            name: name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: i64,
    pub category: Reference,
    pub account: Reference,
    pub payment_method: Reference,
}

impl Transaction {
    pub fn apply(&mut self, patch: TransactionPatch) {
        let TransactionPatch {
            date,
            description,
            amount,
            category,
            account,
            payment_method,
        } = patch;

        if let Some(date) = date {
            self.date = date;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(account) = account {
            self.account = account;
        }
        if let Some(payment_method) = payment_method {
            self.payment_method = payment_method;
        }
    }
}

/// Partial update body; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<Reference>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self == &TransactionPatch::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionFilters {
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl TransactionFilters {
    pub fn for_month(month: &str) -> Self {
        TransactionFilters {
            month: month.to_owned(),
            category: None,
            account: None,
        }
    }

    /// Query-string pairs in a stable order, absent filters omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("month", self.month.as_str())];
        if let Some(category) = &self.category {
            pairs.push(("category", category.as_str()));
        }
        if let Some(account) = &self.account {
            pairs.push(("account", account.as_str()));
        }
        pairs
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        let category = self
            .category
            .as_ref()
            .map_or(true, |id| &transaction.category.id == id);
        let account = self
            .account
            .as_ref()
            .map_or(true, |id| &transaction.account.id == id);
        category && account
    }
}
