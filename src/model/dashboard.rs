use serde::{Deserialize, Serialize};

/// Month-scoped KPI summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_spent: i64,
    pub balance: i64,
    /// Share of the monthly budget already spent, 0.0 to 1.0
    pub budget_usage_percent: f64,
    pub spending_by_category: Vec<CategorySpend>,
    /// Top-N categories; `percent_of_total` values need not sum to 1.0
    pub top_categories: Vec<TopCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: i64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub id: String,
    pub name: String,
    pub amount: i64,
    pub percent_of_total: f64,
}

impl DashboardSummary {
    pub fn top_category(&self) -> Option<&TopCategory> {
        self.top_categories.first()
    }

    /// Budget implied by the amount spent and the usage ratio.
    pub fn budget_total(&self) -> Option<i64> {
        if self.budget_usage_percent > 0.0 {
            let total = self.total_spent as f64 / self.budget_usage_percent;
            Some(total.round() as i64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total_spent: i64, budget_usage_percent: f64) -> DashboardSummary {
        DashboardSummary {
            total_spent,
            balance: 0,
            budget_usage_percent,
            spending_by_category: vec![],
            top_categories: vec![],
        }
    }

    #[test]
    fn test_budget_total() {
        assert_eq!(summary(450000, 0.75).budget_total(), Some(600000));
        assert_eq!(summary(450000, 0.0).budget_total(), None);
    }

    #[test]
    fn test_decodes_camel_case_payload() {
        let payload = r##"{
            "totalSpent": 1000,
            "balance": -250,
            "budgetUsagePercent": 0.5,
            "spendingByCategory": [{"category": "Ocio", "amount": 1000, "color": "#ec4899"}],
            "topCategories": [{"id": "4", "name": "Ocio", "amount": 1000, "percentOfTotal": 1.0}]
        }"##;

        let summary: DashboardSummary = serde_json::from_str(payload).unwrap();
        assert_eq!(summary.balance, -250);
        assert_eq!(summary.top_category().map(|c| c.name.as_str()), Some("Ocio"));
        assert_eq!(summary.spending_by_category[0].color, "#ec4899");
    }
}
