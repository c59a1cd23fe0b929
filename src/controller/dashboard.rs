use actix_web::{get, web, Responder};
use serde::Deserialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    month::Month,
};

#[derive(Debug, Deserialize)]
pub struct Query {
    month: Option<String>,
}

#[get("/dashboard")]
async fn index(
    state: web::Data<AppState<State>>,
    query: web::Query<Query>,
) -> Result<impl Responder, Error> {
    let month = match &query.month {
        Some(month) => month.parse::<Month>()?,
        None => Month::current(),
    };

    let data = state.api.fetch_dashboard_summary(&month.to_string()).await?;
    Ok(web::Json(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};

    use super::*;
    use crate::{controller::testing::app_state, model::DashboardSummary};

    #[actix_web::test]
    async fn test_dashboard_summary() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(index),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/dashboard?month=2024-05")
            .to_request();
        let summary: DashboardSummary =
            test::call_and_read_body_json(&app, request).await;

        assert_eq!(summary.total_spent, 450000);
        assert_eq!(summary.spending_by_category.len(), 4);
    }

    #[actix_web::test]
    async fn test_rejects_malformed_month() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .service(index),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/dashboard?month=2024-13")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Invalid month '2024-13', expected YYYY-MM");
        assert_eq!(body["status"], 400);
    }
}
