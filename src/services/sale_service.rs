use rust_decimal::Decimal;
use sea_orm::*;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::dto::{Page, SaleListQuery, SaleListResponse, SaleRequest, SaleResponse, SaleTotals};
use crate::models::{product, sale};
use crate::services::period::{end_bound, list_period_start, midnight};
use crate::services::pricing::{self, money};
use crate::services::product_service::ProductService;
use crate::services::{clean_optional, now, text_matches};

const PER_PAGE: u64 = 15;

pub struct SaleService;

impl SaleService {
    #[instrument(skip(db))]
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        request: SaleRequest,
    ) -> Result<SaleResponse> {
        request.validate()?;
        let product = ProductService::usable_product(db, owner_id, request.product_id).await?;
        let (unit_cost, unit_price) = snapshot(&product)?;
        pricing::line_total(unit_price, request.quantity)?;

        let stamp = now();
        let sale = sale::ActiveModel {
            user_id: Set(owner_id),
            product_id: Set(product.id),
            quantity: Set(request.quantity),
            unit_cost: Set(unit_cost),
            unit_price: Set(unit_price),
            sale_date: Set(request.sale_date.unwrap_or(stamp)),
            notes: Set(clean_optional(request.notes)),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(
            "Sale {} recorded: {} x product {} for user {}",
            sale.id, sale.quantity, product.id, owner_id
        );
        Ok(SaleResponse::new(sale, Some(product)))
    }

    pub async fn get(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<SaleResponse> {
        let (sale, product) = sale::Entity::find_by_id(id)
            .filter(sale::Column::UserId.eq(owner_id))
            .find_also_related(product::Entity)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(SaleResponse::new(sale, product))
    }

    async fn find_owned(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<sale::Model> {
        sale::Entity::find_by_id(id)
            .filter(sale::Column::UserId.eq(owner_id))
            .one(db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Modification: le coût et le prix sont repris du produit actuel
    #[instrument(skip(db))]
    pub async fn update(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
        request: SaleRequest,
    ) -> Result<SaleResponse> {
        request.validate()?;
        let existing = Self::find_owned(db, owner_id, id).await?;
        let product = ProductService::usable_product(db, owner_id, request.product_id).await?;
        let (unit_cost, unit_price) = snapshot(&product)?;
        pricing::line_total(unit_price, request.quantity)?;

        let mut sale: sale::ActiveModel = existing.clone().into();
        sale.product_id = Set(product.id);
        sale.quantity = Set(request.quantity);
        sale.unit_cost = Set(unit_cost);
        sale.unit_price = Set(unit_price);
        sale.sale_date = Set(request.sale_date.unwrap_or(existing.sale_date));
        sale.notes = Set(clean_optional(request.notes));
        sale.updated_at = Set(now());
        let sale = sale.update(db).await?;

        info!("Sale {} updated", id);
        Ok(SaleResponse::new(sale, Some(product)))
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<()> {
        let sale = Self::find_owned(db, owner_id, id).await?;
        sale.delete(db).await?;
        info!("Sale {} deleted", id);
        Ok(())
    }

    /// Liste filtrée, la plus récente d'abord. Les totaux portent sur
    /// l'ensemble filtré, pas seulement sur la page affichée.
    #[instrument(skip(db))]
    pub async fn list(
        db: &DatabaseConnection,
        owner_id: i32,
        query: &SaleListQuery,
    ) -> Result<SaleListResponse> {
        let mut select = sale::Entity::find()
            .filter(sale::Column::UserId.eq(owner_id))
            .find_also_related(product::Entity);

        if let Some(product_id) = query.product_id {
            select = select.filter(sale::Column::ProductId.eq(product_id));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(start) = query.start {
            select = select.filter(sale::Column::SaleDate.gte(midnight(start)));
        }
        if let Some(end) = query.end {
            select = select.filter(sale::Column::SaleDate.lt(end_bound(end)?));
        }
        if let Some(period) = query.period {
            select = select.filter(sale::Column::SaleDate.gte(list_period_start(period, now())));
        }
        let search = clean_optional(query.search.clone());

        let rows: Vec<_> = select
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter(|(s, p)| {
                let product_name = p.as_ref().map(|p| p.name.as_str());
                search
                    .as_deref()
                    .is_none_or(|needle| text_matches(needle, &[product_name, s.notes.as_deref()]))
            })
            .collect();
        debug!("{} sales matched", rows.len());

        let totals = totals(rows.iter().map(|(s, _)| s));
        let items = rows
            .into_iter()
            .map(|(s, p)| SaleResponse::new(s, p))
            .collect();

        Ok(SaleListResponse {
            page: Page::from_items(items, query.page, query.per_page.unwrap_or(PER_PAGE)),
            totals,
        })
    }
}

/// Coût et prix unitaires figés sur la vente, arrondis au centime
pub fn snapshot(product: &product::Model) -> Result<(Decimal, Decimal)> {
    let price = pricing::price_for(product.base_cost, product.margin_percent)
        .map_err(|_| AppError::validation("product_id", "Product price is out of range"))?;
    Ok((money(product.base_cost), money(price)))
}

pub fn totals<'a>(sales: impl Iterator<Item = &'a sale::Model>) -> SaleTotals {
    let mut totals = sales.fold(SaleTotals::default(), |mut acc, s| {
        acc.revenue = acc.revenue.saturating_add(s.revenue());
        acc.cost = acc.cost.saturating_add(s.cost());
        acc.profit = acc.profit.saturating_add(s.profit());
        acc
    });
    totals.revenue = money(totals.revenue);
    totals.cost = money(totals.cost);
    totals.profit = money(totals.profit);
    totals
}
