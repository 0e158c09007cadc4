use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::models::dto::PriceSimulationRequest;
use crate::services::product_service::ProductService;

/// POST /api/pricing/simulate - Prix pour une autre marge (rien n'est enregistré)
#[post("/simulate")]
pub async fn simulate_price(
    auth_user: AuthUser,
    body: web::Json<PriceSimulationRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let simulation =
        ProductService::simulate_price(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(simulation))
}

pub fn pricing_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/pricing").service(simulate_price));
}
