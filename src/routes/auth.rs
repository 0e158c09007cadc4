use actix_web::{get, post, web, HttpResponse};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::users::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users, Model as User,
};
use crate::models::{category, expense, product, sale};
use crate::services::now;
use crate::utils::jwt::JwtKeys;
use crate::utils::password;

// DTO pour l'inscription
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// DTO pour changer le mot de passe
#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

// Réponse après login/register
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
}

#[derive(Serialize)]
pub struct ProfileStats {
    pub categories: u64,
    pub products: u64,
    pub sales: u64,
    pub expenses: u64,
}

// Réponse pour /auth/me
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub username: String,
    pub created_at: NaiveDateTime,
    pub stats: ProfileStats,
}

const USERNAME_TAKEN: &str = "Username already exists";

fn issue_token(keys: &JwtKeys, user_id: i32, username: &str) -> Result<String> {
    keys.generate_token(user_id, username).map_err(AppError::Internal)
}

// L'index unique tranche si deux inscriptions passent la vérification en même temps
async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    password_hash: String,
) -> Result<User> {
    UserActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::unique_conflict(e, USERNAME_TAKEN))
}

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    body.validate()?;
    let username = body.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("username", "this field is required"));
    }

    // 1. Vérifier si l'utilisateur existe déjà
    let existing = Users::find()
        .filter(UserColumn::Username.eq(&username))
        .one(db.get_ref())
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
    }

    // 2. Hash le mot de passe
    let password_hash = password::hash_password(&body.password).map_err(AppError::Internal)?;

    // 3. Créer l'utilisateur
    let user = insert_user(db.get_ref(), &username, password_hash).await?;
    info!("User {} registered", user.id);

    // 4. Générer le JWT
    let token = issue_token(&keys, user.id, &username)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
        username,
    }))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse> {
    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

    // 1. Trouver l'utilisateur
    let user = Users::find()
        .filter(UserColumn::Username.eq(body.username.trim()))
        .one(db.get_ref())
        .await?
        .ok_or_else(invalid)?;

    // 2. Vérifier le mot de passe
    if !password::verify_password(&body.password, &user.password_hash).map_err(AppError::Internal)? {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    // 3. Générer le JWT
    let token = issue_token(&keys, user.id, &user.username)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// GET /auth/me - Profil + compteurs (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse> {
    let db = db.get_ref();
    let user = Users::find_by_id(auth_user.user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    let stats = ProfileStats {
        categories: category::Entity::find()
            .filter(category::Column::UserId.eq(user.id))
            .count(db)
            .await?,
        products: product::Entity::find()
            .filter(product::Column::UserId.eq(user.id))
            .count(db)
            .await?,
        sales: sale::Entity::find()
            .filter(sale::Column::UserId.eq(user.id))
            .count(db)
            .await?,
        expenses: expense::Entity::find()
            .filter(expense::Column::UserId.eq(user.id))
            .count(db)
            .await?,
    };

    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: user.id,
        username: user.username,
        created_at: user.created_at,
        stats,
    }))
}

/// POST /auth/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse> {
    body.validate()?;

    // 1. Récupérer l'utilisateur
    let user = Users::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or(AppError::NotFound)?;

    // 2. Vérifier l'ancien mot de passe
    if !password::verify_password(&body.current_password, &user.password_hash)
        .map_err(AppError::Internal)?
    {
        return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
    }

    // 3. Hasher le nouveau mot de passe et mettre à jour
    let new_password_hash = password::hash_password(&body.new_password).map_err(AppError::Internal)?;
    let mut active_model: UserActiveModel = user.into();
    active_model.password_hash = Set(new_password_hash);
    active_model.update(db.get_ref()).await?;
    info!("User {} changed password", auth_user.user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(me)
            .service(change_password),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{create_user, setup_test_db};

    #[tokio::test]
    async fn test_insert_duplicate_username_is_conflict() {
        let db = setup_test_db().await;
        create_user(&db, "alice").await;

        // la vérification préalable a été dépassée: seul l'index unique répond
        let hash = password::hash_password("correct horse").unwrap();
        match insert_user(&db, "alice", hash.clone()).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, USERNAME_TAKEN),
            other => panic!("expected conflict, got {:?}", other),
        }

        let bob = insert_user(&db, "bob", hash).await.unwrap();
        assert_eq!(bob.username, "bob");
    }
}
