use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::Result;
use crate::middleware::AuthUser;
use crate::models::dto::{CategoryListQuery, CategoryRequest};
use crate::services::category_service::CategoryService;

/// GET /api/categories - Liste paginée (?search=&include_inactive=&page=)
#[get("")]
pub async fn list_categories(
    auth_user: AuthUser,
    query: web::Query<CategoryListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let page = CategoryService::list(db.get_ref(), auth_user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/categories
#[post("")]
pub async fn create_category(
    auth_user: AuthUser,
    body: web::Json<CategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let category = CategoryService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(category))
}

/// GET /api/categories/{id}
#[get("/{id}")]
pub async fn get_category(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let category = CategoryService::get(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// PUT /api/categories/{id}
#[put("/{id}")]
pub async fn update_category(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let category = CategoryService::update(
        db.get_ref(),
        auth_user.user_id,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /api/categories/{id} - Désactivation, pas de suppression
#[delete("/{id}")]
pub async fn deactivate_category(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    let category =
        CategoryService::deactivate(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

pub fn category_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(list_categories)
            .service(create_category)
            .service(get_category)
            .service(update_category)
            .service(deactivate_category),
    );
}
