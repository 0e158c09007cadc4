use sea_orm::*;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::dto::{CategoryListQuery, CategoryRequest, CategoryResponse, Page};
use crate::models::{category, product};
use crate::services::{clean_optional, fold_case, normalize_name, now, text_matches};

const PER_PAGE: u64 = 10;
const DUPLICATE_NAME: &str = "A category with this name already exists";

pub struct CategoryService;

impl CategoryService {
    /// Catégories de l'utilisateur triées par nom (actives seulement par défaut)
    #[instrument(skip(db))]
    pub async fn list(
        db: &DatabaseConnection,
        owner_id: i32,
        query: &CategoryListQuery,
    ) -> Result<Page<CategoryResponse>> {
        let mut select = category::Entity::find().filter(category::Column::UserId.eq(owner_id));

        if !query.include_inactive.unwrap_or(false) {
            select = select.filter(category::Column::Active.eq(true));
        }
        let search = clean_optional(query.search.clone());

        let rows: Vec<category::Model> = select
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .filter(|c| {
                search
                    .as_deref()
                    .is_none_or(|s| text_matches(s, &[Some(c.name.as_str())]))
            })
            .collect();
        debug!("{} categories matched", rows.len());

        let items = rows.into_iter().map(CategoryResponse::from).collect();
        Ok(Page::from_items(items, query.page, query.per_page.unwrap_or(PER_PAGE)))
    }

    pub async fn get(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<CategoryResponse> {
        Ok(Self::find_owned(db, owner_id, id).await?.into())
    }

    /// Ligne appartenant à `owner_id`, sinon NotFound (même si l'id existe ailleurs)
    pub async fn find_owned(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<category::Model> {
        category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(owner_id))
            .one(db)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        request: CategoryRequest,
    ) -> Result<CategoryResponse> {
        request.validate()?;
        let name = normalize_name(&request.name);
        Self::ensure_unique_name(db, owner_id, &name, None).await?;

        let stamp = now();
        let category = category::ActiveModel {
            user_id: Set(owner_id),
            name: Set(name),
            description: Set(clean_optional(request.description)),
            active: Set(request.active.unwrap_or(true)),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| AppError::unique_violation(e, "name", DUPLICATE_NAME))?;

        info!("Category {} created for user {}", category.id, owner_id);
        Ok(category.into())
    }

    #[instrument(skip(db))]
    pub async fn update(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
        request: CategoryRequest,
    ) -> Result<CategoryResponse> {
        request.validate()?;
        let existing = Self::find_owned(db, owner_id, id).await?;
        let name = normalize_name(&request.name);
        Self::ensure_unique_name(db, owner_id, &name, Some(id)).await?;

        let active = request.active.unwrap_or(existing.active);
        if existing.active && !active {
            Self::ensure_no_active_products(db, owner_id, id).await?;
        }

        let mut category: category::ActiveModel = existing.into();
        category.name = Set(name);
        category.description = Set(clean_optional(request.description));
        category.active = Set(active);
        category.updated_at = Set(now());

        let category = category
            .update(db)
            .await
            .map_err(|e| AppError::unique_violation(e, "name", DUPLICATE_NAME))?;

        info!("Category {} updated", id);
        Ok(category.into())
    }

    /// Désactivation (pas de suppression physique).
    /// Refusée tant que des produits actifs y sont rattachés.
    #[instrument(skip(db))]
    pub async fn deactivate(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<CategoryResponse> {
        let existing = Self::find_owned(db, owner_id, id).await?;
        if !existing.active {
            return Ok(existing.into());
        }
        Self::ensure_no_active_products(db, owner_id, id).await?;

        let mut category: category::ActiveModel = existing.into();
        category.active = Set(false);
        category.updated_at = Set(now());
        let category = category.update(db).await?;

        info!("Category {} deactivated", id);
        Ok(category.into())
    }

    /// Comparaison insensible à la casse (Unicode), en excluant la ligne modifiée
    async fn ensure_unique_name(
        db: &DatabaseConnection,
        owner_id: i32,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<()> {
        let mut select = category::Entity::find()
            .select_only()
            .column(category::Column::Name)
            .filter(category::Column::UserId.eq(owner_id));
        if let Some(id) = exclude_id {
            select = select.filter(category::Column::Id.ne(id));
        }

        let wanted = fold_case(name);
        let names: Vec<String> = select.into_tuple().all(db).await?;
        if names.iter().any(|existing| fold_case(existing) == wanted) {
            return Err(AppError::validation("name", DUPLICATE_NAME));
        }
        Ok(())
    }

    async fn ensure_no_active_products(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<()> {
        let active_products = product::Entity::find()
            .filter(product::Column::UserId.eq(owner_id))
            .filter(product::Column::CategoryId.eq(id))
            .filter(product::Column::Active.eq(true))
            .count(db)
            .await?;

        if active_products > 0 {
            return Err(AppError::validation(
                "active",
                format!(
                    "Cannot deactivate a category with {} active product(s)",
                    active_products
                ),
            ));
        }
        Ok(())
    }
}
