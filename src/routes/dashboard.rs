use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::services::dashboard_service::{DashboardQuery, DashboardService};
use crate::services::now;

/// GET /api/dashboard?window=30d|90d|6m|12m
#[get("/dashboard")]
pub async fn dashboard(
    auth_user: AuthUser,
    query: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let window = query.window.unwrap_or_default();
    let dashboard = DashboardService::dashboard(db.get_ref(), auth_user.user_id, window, now()).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

/// GET /api/summary - Résumé de la page d'accueil
#[get("/summary")]
pub async fn summary(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let summary = DashboardService::summary(db.get_ref(), auth_user.user_id, now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
