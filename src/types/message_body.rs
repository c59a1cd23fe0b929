use serde::Deserialize;

/// Error body sent by the API alongside non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}
