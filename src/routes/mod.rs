pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod expenses;
pub mod health;
pub mod pricing;
pub mod products;
pub mod reports;
pub mod sales;

use actix_web::web;

use crate::errors::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Corps JSON / paramètres invalides → même format que les erreurs de validation
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| AppError::validation("body", err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| AppError::validation("query", err.to_string()).into()),
            )
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(categories::category_routes)
            .configure(products::product_routes)
            .configure(pricing::pricing_routes)
            .configure(sales::sale_routes)
            .configure(expenses::expense_routes)
            .service(reports::report)
            .service(dashboard::dashboard)
            .service(dashboard::summary),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use super::configure_routes;
    use crate::db::test_utils::{create_user, setup_test_db};
    use crate::utils::jwt::JwtKeys;

    const SECRET: &str = "test-secret";

    fn bearer(user_id: i32, username: &str) -> (&'static str, String) {
        let token = JwtKeys::new(SECRET, 1).generate_token(user_id, username).unwrap();
        ("Authorization", format!("Bearer {}", token))
    }

    macro_rules! test_app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($db.clone()))
                    .app_data(web::Data::new(JwtKeys::new(SECRET, 1)))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let db = setup_test_db().await;
        let app = test_app!(db);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["database"], "ok");
    }

    #[actix_web::test]
    async fn test_register_login_me() {
        let db = setup_test_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"username": "alice", "password": "correct horse"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let duplicate = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"username": "alice", "password": "another one"}))
            .to_request();
        assert_eq!(test::call_service(&app, duplicate).await.status(), StatusCode::CONFLICT);

        let wrong = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "alice", "password": "wrong password"}))
            .to_request();
        assert_eq!(test::call_service(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

        let login = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "alice", "password": "correct horse"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, login).await;
        let token = body["token"].as_str().unwrap().to_string();

        let me = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, me).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["stats"]["sales"], 0);
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let db = setup_test_db().await;
        let app = test_app!(db);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/categories").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/dashboard")
                .insert_header(("Authorization", "Bearer not-a-token"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_validation_errors_list_fields() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({
                "name": "Cake",
                "base_cost": "-5",
                "margin_percent": "1500",
                "category_id": 1
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Validation failed");
        assert!(body["fields"]["base_cost"].is_string());
        assert!(body["fields"]["margin_percent"].is_string());
    }

    #[actix_web::test]
    async fn test_oversized_cost_is_rejected_and_not_stored() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"name": "Metals"}))
            .to_request();
        let category: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({
                "name": "Gold",
                "base_cost": "70000000000000000000000000000",
                "margin_percent": "500",
                "category_id": category["id"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["fields"]["base_cost"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/products?include_inactive=true")
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total_items"], 0);
    }

    #[actix_web::test]
    async fn test_extreme_dates_are_validation_errors() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let app = test_app!(db);

        // "+" doit être encodé dans la query string
        let last = chrono::NaiveDate::MAX.to_string().replace('+', "%2B");
        for uri in [
            format!("/api/sales?end={}", last),
            format!("/api/expenses?end={}", last),
            format!("/api/reports?end={}", last),
            "/api/reports?period=day&start=0001-01-01&end=9999-12-31".to_string(),
        ] {
            let req = test::TestRequest::get()
                .uri(&uri)
                .insert_header(bearer(alice, "alice"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["fields"]["end"].is_string(), "{}", uri);
        }

        let req = test::TestRequest::get()
            .uri("/api/reports?period=month&start=2015-01-01&end=2024-12-31")
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["series"].as_array().map(|s| s.len()), Some(120));
    }

    #[actix_web::test]
    async fn test_foreign_rows_are_not_found() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"name": "drinks"}))
            .to_request();
        let category: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(category["name"], "Drinks");
        let id = category["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri("/api/expenses")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"description": "Rent", "category": "operational", "amount": "900"}))
            .to_request();
        let expense: Value = test::call_and_read_body_json(&app, req).await;
        let expense_id = expense["id"].as_i64().unwrap();

        for uri in [
            format!("/api/categories/{}", id),
            format!("/api/expenses/{}", expense_id),
            "/api/sales/999".to_string(),
        ] {
            let req = test::TestRequest::get()
                .uri(&uri)
                .insert_header(bearer(bob, "bob"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Not found");
        }
    }

    #[actix_web::test]
    async fn test_product_price_and_sale_flow() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"name": "Services"}))
            .to_request();
        let category: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({
                "name": "Consulting",
                "base_cost": "100",
                "margin_percent": "25",
                "category_id": category["id"]
            }))
            .to_request();
        let product: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(product["final_price"], "125.00");
        let product_id = product["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/sales/product-price?product_id={}", product_id))
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let price: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(price["price"], "125.00");
        assert_eq!(price["category"], "Services");

        let req = test::TestRequest::get()
            .uri(&format!("/api/sales/product-price?product_id={}", product_id))
            .insert_header(bearer(bob, "bob"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/sales")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"product_id": product_id, "quantity": "3"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let sale: Value = test::read_body_json(resp).await;
        assert_eq!(sale["revenue"], "375.00");
        assert_eq!(sale["profit"], "75.00");
        assert_eq!(sale["realized_margin"], "25.00");

        let req = test::TestRequest::get()
            .uri("/api/sales")
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total_items"], 1);
        assert_eq!(list["totals"]["cost"], "300.00");

        let req = test::TestRequest::post()
            .uri("/api/pricing/simulate")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({"product_id": product_id, "margin": "40"}))
            .to_request();
        let simulation: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(simulation["price"], "140.00");
    }

    #[actix_web::test]
    async fn test_mark_paid() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let app = test_app!(db);

        let yesterday = crate::services::today() - chrono::Duration::days(1);
        let req = test::TestRequest::post()
            .uri("/api/expenses")
            .insert_header(bearer(alice, "alice"))
            .set_json(json!({
                "description": "Electricity",
                "category": "infrastructure",
                "amount": "120.50",
                "due_date": yesterday
            }))
            .to_request();
        let expense: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(expense["status"], "overdue");

        let req = test::TestRequest::post()
            .uri(&format!("/api/expenses/{}/mark-paid", expense["id"]))
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let paid: Value = test::read_body_json(resp).await;
        assert_eq!(paid["status"], "paid");
        assert!(paid["paid_at"].is_string());

        let req = test::TestRequest::get()
            .uri("/api/dashboard?window=30d")
            .insert_header(bearer(alice, "alice"))
            .to_request();
        let dashboard: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(dashboard["window"], "30d");
        assert_eq!(dashboard["kpis"]["expenses_paid"], "120.50");
    }
}
