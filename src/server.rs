use std::net::TcpListener;

use actix_cors::Cors;
use actix_web::{
    dev::Server, http::header, middleware, web, App, HttpServer,
};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    controller::{dashboard, health, transactions, version},
    error::Error,
};

pub const API_SCOPE: &str = "/api";

pub async fn server_task(app_state: &AppState<State>) -> Result<(), Error> {
    let app = app_state.clone();
    tokio::spawn(async move {
        let listener = TcpListener::bind((
            app.config.server_host.as_str(),
            app.config.port,
        ))?;
        let server = init_server(app, listener)?;
        server.await?;
        Ok(())
    })
    .await?
}

pub fn routes(config: &mut web::ServiceConfig) {
    config
        .service(dashboard::index)
        .service(transactions::index)
        .service(transactions::update)
        .service(health::index)
        .service(version::index);
}

pub fn init_server(
    app_state: AppState<State>,
    listener: TcpListener,
) -> Result<Server, Error> {
    info!(
        "{} serving {} fixtures on http://{}{}",
        app_state.config.app_name,
        app_state.api.source_name(),
        listener.local_addr()?,
        API_SCOPE
    );

    let server = HttpServer::new(move || {
        let app = app_state.clone();
        let allowed_cors = String::from("*");
        let cors_access_all =
            app.config.allowed_origins.contains(&allowed_cors);
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                if cors_access_all {
                    return true;
                }
                let allowed = &app.config.allowed_origins;
                if let Ok(origin) = origin.to_str() {
                    return allowed.contains(&origin.to_owned());
                }
                false
            })
            .allowed_methods(vec!["GET", "PATCH"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(4096).error_handler(
                |err, _| Error::InvalidBody(err.to_string()).into(),
            ))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                Error::InvalidOption {
                    option: err.to_string(),
                }
                .into()
            }))
            .service(web::scope(API_SCOPE).configure(routes))
    })
    .listen(listener)?
    .disable_signals()
    .run();

    Ok(server)
}
