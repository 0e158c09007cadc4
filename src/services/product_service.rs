use sea_orm::*;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::dto::{
    Page, PriceSimulationRequest, PriceSimulationResponse, ProductListQuery, ProductPriceResponse,
    ProductRequest, ProductResponse,
};
use crate::models::{category, product};
use crate::services::pricing::{self, money};
use crate::services::{clean_optional, normalize_name, now, text_matches};

const PER_PAGE: u64 = 10;

pub struct ProductService;

impl ProductService {
    /// Produits de l'utilisateur avec le nom de leur catégorie, triés par nom
    #[instrument(skip(db))]
    pub async fn list(
        db: &DatabaseConnection,
        owner_id: i32,
        query: &ProductListQuery,
    ) -> Result<Page<ProductResponse>> {
        let mut select = product::Entity::find()
            .filter(product::Column::UserId.eq(owner_id))
            .find_also_related(category::Entity);

        if !query.include_inactive.unwrap_or(false) {
            select = select.filter(product::Column::Active.eq(true));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        let search = clean_optional(query.search.clone());

        let rows: Vec<_> = select
            .order_by_asc(product::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .filter(|(p, _)| {
                search
                    .as_deref()
                    .is_none_or(|s| text_matches(s, &[Some(p.name.as_str())]))
            })
            .collect();
        debug!("{} products matched", rows.len());

        let items = rows
            .into_iter()
            .map(|(p, c)| ProductResponse::new(p, c))
            .collect();
        Ok(Page::from_items(items, query.page, query.per_page.unwrap_or(PER_PAGE)))
    }

    pub async fn get(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<ProductResponse> {
        let (product, category) = product::Entity::find_by_id(id)
            .filter(product::Column::UserId.eq(owner_id))
            .find_also_related(category::Entity)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(ProductResponse::new(product, category))
    }

    pub async fn find_owned(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<product::Model> {
        product::Entity::find_by_id(id)
            .filter(product::Column::UserId.eq(owner_id))
            .one(db)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        request: ProductRequest,
    ) -> Result<ProductResponse> {
        request.validate()?;
        let margin = request.margin_percent.unwrap_or_else(pricing::default_margin);
        pricing::price_for(request.base_cost, margin)?;
        let category = Self::usable_category(db, owner_id, request.category_id).await?;

        let stamp = now();
        let product = product::ActiveModel {
            user_id: Set(owner_id),
            category_id: Set(category.id),
            name: Set(normalize_name(&request.name)),
            description: Set(clean_optional(request.description)),
            base_cost: Set(request.base_cost),
            margin_percent: Set(margin),
            active: Set(request.active.unwrap_or(true)),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("Product {} created for user {}", product.id, owner_id);
        Ok(ProductResponse::new(product, Some(category)))
    }

    #[instrument(skip(db))]
    pub async fn update(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
        request: ProductRequest,
    ) -> Result<ProductResponse> {
        request.validate()?;
        let existing = Self::find_owned(db, owner_id, id).await?;
        let margin = request.margin_percent.unwrap_or(existing.margin_percent);
        pricing::price_for(request.base_cost, margin)?;

        // Un produit peut rester dans sa catégorie même si elle a été désactivée
        // entre-temps, mais on ne peut pas le déplacer vers une catégorie inactive.
        let category = if request.category_id == existing.category_id {
            category::Entity::find_by_id(existing.category_id)
                .filter(category::Column::UserId.eq(owner_id))
                .one(db)
                .await?
        } else {
            Some(Self::usable_category(db, owner_id, request.category_id).await?)
        };

        let mut product: product::ActiveModel = existing.clone().into();
        product.category_id = Set(request.category_id);
        product.name = Set(normalize_name(&request.name));
        product.description = Set(clean_optional(request.description));
        product.base_cost = Set(request.base_cost);
        product.margin_percent = Set(margin);
        product.active = Set(request.active.unwrap_or(existing.active));
        product.updated_at = Set(now());
        let product = product.update(db).await?;

        info!("Product {} updated", id);
        Ok(ProductResponse::new(product, category))
    }

    /// Désactivation logique: les ventes passées gardent leur produit
    #[instrument(skip(db))]
    pub async fn deactivate(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<ProductResponse> {
        let existing = Self::find_owned(db, owner_id, id).await?;
        let category = category::Entity::find_by_id(existing.category_id).one(db).await?;

        let mut product: product::ActiveModel = existing.into();
        product.active = Set(false);
        product.updated_at = Set(now());
        let product = product.update(db).await?;

        info!("Product {} deactivated", id);
        Ok(ProductResponse::new(product, category))
    }

    /// Prix pour une marge hypothétique, rien n'est enregistré
    #[instrument(skip(db))]
    pub async fn simulate_price(
        db: &DatabaseConnection,
        owner_id: i32,
        request: PriceSimulationRequest,
    ) -> Result<PriceSimulationResponse> {
        request.validate()?;
        let product = Self::find_owned(db, owner_id, request.product_id).await?;
        let price = pricing::price_for(product.base_cost, request.margin)
            .map_err(|_| AppError::validation("margin", "resulting price is too large"))?;

        Ok(PriceSimulationResponse {
            product_id: product.id,
            base_cost: money(product.base_cost),
            margin: money(request.margin),
            price: money(price),
            profit: money(price - product.base_cost),
        })
    }

    /// Pré-remplissage du formulaire de vente: seulement les produits actifs
    pub async fn price_lookup(
        db: &DatabaseConnection,
        owner_id: i32,
        product_id: i32,
    ) -> Result<ProductPriceResponse> {
        let (product, category) = product::Entity::find_by_id(product_id)
            .filter(product::Column::UserId.eq(owner_id))
            .filter(product::Column::Active.eq(true))
            .find_also_related(category::Entity)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(ProductPriceResponse {
            product_id: product.id,
            price: money(product.final_price()),
            cost: money(product.base_cost),
            margin: money(product.margin_percent),
            category: category.map(|c| c.name),
            name: product.name,
        })
    }

    /// Produit actif de l'utilisateur, requis pour enregistrer une vente
    pub async fn usable_product(
        db: &DatabaseConnection,
        owner_id: i32,
        product_id: i32,
    ) -> Result<product::Model> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::UserId.eq(owner_id))
            .filter(product::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| AppError::validation("product_id", "Select a valid, active product"))
    }

    async fn usable_category(
        db: &DatabaseConnection,
        owner_id: i32,
        category_id: i32,
    ) -> Result<category::Model> {
        category::Entity::find_by_id(category_id)
            .filter(category::Column::UserId.eq(owner_id))
            .filter(category::Column::Active.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| AppError::validation("category_id", "Select a valid, active category"))
    }
}
