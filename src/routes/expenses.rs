use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::models::dto::{ExpenseListQuery, ExpenseRequest};
use crate::services::expense_service::ExpenseService;

/// GET /api/expenses - Liste filtrée + totaux
/// (?category=&status=&start=&end=&period=&search=&page=)
#[get("")]
pub async fn list_expenses(
    auth_user: AuthUser,
    query: web::Query<ExpenseListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let expenses = ExpenseService::list(db.get_ref(), auth_user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(expenses))
}

/// POST /api/expenses
#[post("")]
pub async fn create_expense(
    auth_user: AuthUser,
    body: web::Json<ExpenseRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let expense = ExpenseService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(expense))
}

/// GET /api/expenses/{id}
#[get("/{id}")]
pub async fn get_expense(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let expense = ExpenseService::get(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(expense))
}

/// PUT /api/expenses/{id}
#[put("/{id}")]
pub async fn update_expense(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ExpenseRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let expense = ExpenseService::update(
        db.get_ref(),
        auth_user.user_id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(expense))
}

/// DELETE /api/expenses/{id}
#[delete("/{id}")]
pub async fn delete_expense(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    ExpenseService::delete(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/expenses/{id}/mark-paid
#[post("/{id}/mark-paid")]
pub async fn mark_paid(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let expense = ExpenseService::mark_paid(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(expense))
}

pub fn expense_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/expenses")
            .service(list_expenses)
            .service(create_expense)
            .service(get_expense)
            .service(update_expense)
            .service(delete_expense)
            .service(mark_paid),
    );
}
