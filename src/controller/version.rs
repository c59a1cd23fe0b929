use actix_web::{get, web, Responder};
use serde::{Deserialize, Serialize};

use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/version")]
async fn index(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

    Ok(web::Json(Response {
        app: state.config.app_name.to_owned(),
        version: VERSION,
        source: state.api.source_name(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response<'a> {
    pub app: String,
    pub version: Option<&'a str>,
    pub source: &'a str,
}
