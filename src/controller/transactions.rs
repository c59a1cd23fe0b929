use actix_web::{get, patch, web, Responder};
use serde::Deserialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::{TransactionFilters, TransactionPatch},
    month::Month,
};

#[derive(Debug, Deserialize)]
pub struct Query {
    month: Option<String>,
    category: Option<String>,
    account: Option<String>,
}

#[get("/transactions")]
async fn index(
    state: web::Data<AppState<State>>,
    query: web::Query<Query>,
) -> Result<impl Responder, Error> {
    let Query {
        month,
        category,
        account,
    } = query.into_inner();
    let month = match month {
        Some(month) => month.parse::<Month>()?,
        None => Month::current(),
    };

    let filters = TransactionFilters {
        month: month.to_string(),
        category,
        account,
    };
    let data = state.api.fetch_transactions(&filters).await?;

    Ok(web::Json(data))
}

#[patch("/transactions/{id}")]
async fn update(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
    body: web::Json<TransactionPatch>,
) -> Result<impl Responder, Error> {
    let id = path.into_inner();
    let data = state.api.update_transaction(&id, &body).await?;

    Ok(web::Json(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};

    use super::*;
    use crate::{controller::testing::app_state, model::Transaction};

    #[actix_web::test]
    async fn test_filters_by_category() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(index),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/transactions?month=2024-05&category=c3")
            .to_request();
        let items: Vec<Transaction> =
            test::call_and_read_body_json(&app, request).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Carga Bip!");
    }

    #[actix_web::test]
    async fn test_update_then_list_reflects_patch() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(index)
                .service(update),
        )
        .await;

        let request = test::TestRequest::patch()
            .uri("/transactions/t2")
            .set_json(serde_json::json!({ "amount": 47000 }))
            .to_request();
        let updated: Transaction =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(updated.amount, 47000);
        assert_eq!(updated.description, "Pago CGE");

        let request = test::TestRequest::get()
            .uri("/transactions?month=2024-05&category=c2")
            .to_request();
        let items: Vec<Transaction> =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(items[0].amount, 47000);
    }

    #[actix_web::test]
    async fn test_update_unknown_id_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(update),
        )
        .await;

        let request = test::TestRequest::patch()
            .uri("/transactions/t404")
            .set_json(serde_json::json!({ "description": "x" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Transacción no encontrada: t404");
    }
}
