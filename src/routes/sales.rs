use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::models::dto::{ProductPriceQuery, SaleListQuery, SaleRequest};
use crate::services::product_service::ProductService;
use crate::services::sale_service::SaleService;

/// GET /api/sales - Liste filtrée + totaux
/// (?product_id=&category_id=&start=&end=&period=&search=&page=)
#[get("")]
pub async fn list_sales(
    auth_user: AuthUser,
    query: web::Query<SaleListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let sales = SaleService::list(db.get_ref(), auth_user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(sales))
}

/// POST /api/sales
#[post("")]
pub async fn create_sale(
    auth_user: AuthUser,
    body: web::Json<SaleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let sale = SaleService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(sale))
}

/// GET /api/sales/product-price?product_id= - Pré-remplissage du formulaire
/// (déclaré avant /{id})
#[get("/product-price")]
pub async fn product_price(
    auth_user: AuthUser,
    query: web::Query<ProductPriceQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let price = ProductService::price_lookup(db.get_ref(), auth_user.user_id, query.product_id).await?;
    Ok(HttpResponse::Ok().json(price))
}

/// GET /api/sales/{id}
#[get("/{id}")]
pub async fn get_sale(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let sale = SaleService::get(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// PUT /api/sales/{id} - Reprend le coût et le prix actuels du produit
#[put("/{id}")]
pub async fn update_sale(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<SaleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let sale = SaleService::update(
        db.get_ref(),
        auth_user.user_id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// DELETE /api/sales/{id}
#[delete("/{id}")]
pub async fn delete_sale(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    SaleService::delete(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn sale_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .service(list_sales)
            .service(create_sale)
            .service(product_price)
            .service(get_sale)
            .service(update_sale)
            .service(delete_sale),
    );
}
