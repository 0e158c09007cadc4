use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::models::dto::{ProductListQuery, ProductRequest};
use crate::services::product_service::ProductService;

/// GET /api/products - Liste paginée (?category_id=&search=&include_inactive=&page=)
#[get("")]
pub async fn list_products(
    auth_user: AuthUser,
    query: web::Query<ProductListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let page = ProductService::list(db.get_ref(), auth_user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/products
#[post("")]
pub async fn create_product(
    auth_user: AuthUser,
    body: web::Json<ProductRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let product = ProductService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

/// GET /api/products/{id}
#[get("/{id}")]
pub async fn get_product(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let product = ProductService::get(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// PUT /api/products/{id}
#[put("/{id}")]
pub async fn update_product(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ProductRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let product = ProductService::update(
        db.get_ref(),
        auth_user.user_id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(product))
}

/// DELETE /api/products/{id} - Désactivation, les ventes restent intactes
#[delete("/{id}")]
pub async fn deactivate_product(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let product =
        ProductService::deactivate(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub fn product_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(list_products)
            .service(create_product)
            .service(get_product)
            .service(update_product)
            .service(deactivate_product),
    );
}
