pub use self::{health_status::HealthStatus, message_body::MessageBody};

mod health_status;
mod message_body;
