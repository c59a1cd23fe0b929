pub use self::{
    data_source::{Api, DataSource},
    http::HTTP,
    mock::{Latency, Mock},
};

mod data_source;
mod http;
mod mock;
