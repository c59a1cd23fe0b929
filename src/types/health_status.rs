use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        HealthStatus {
            status: String::from("ok"),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
