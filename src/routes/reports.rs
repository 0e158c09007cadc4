use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::services::report_service::{ReportQuery, ReportService};
use crate::services::today;

/// GET /api/reports?period=day|week|month|year&start=&end=&category_id=&product_id=
#[get("/reports")]
pub async fn report(
    auth_user: AuthUser,
    query: web::Query<ReportQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let report = ReportService::generate(db.get_ref(), auth_user.user_id, &query, today()).await?;
    Ok(HttpResponse::Ok().json(report))
}
