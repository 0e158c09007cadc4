// ============================================================================
// SERVICE : RAPPORTS DE VENTES
// ============================================================================
//
// Description:
//   Agrège les ventes d'une fenêtre de dates par bucket (jour, semaine, mois,
//   année), par catégorie et par produit.
//
// Règles:
//   - Sans start/end: période calendaire courante de la granularité demandée
//   - Chaque bucket de la fenêtre apparaît, même vide (valeurs à zéro)
//   - Au plus MAX_BUCKETS points: au-delà la requête est refusée sur `end`
//   - average_margin = profit / cost × 100 (0 si cost = 0)
//   - Catégories et produits triés par chiffre d'affaires décroissant
//
// ============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{AppError, Result};
use crate::models::{category, product, sale};
use crate::services::period::{end_bound, midnight, Bucket, DateRange, MAX_BUCKETS};
use crate::services::pricing::{self, money};

const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub period: Option<Bucket>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub product_id: Option<i32>,
}

/// Cumul de ventes réutilisé par le rapport et le tableau de bord
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaleStats {
    pub sale_count: u64,
    pub quantity: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub average_margin: Decimal,
}

impl SaleStats {
    pub fn add(&mut self, sale: &sale::Model) {
        self.sale_count += 1;
        self.quantity = self.quantity.saturating_add(sale.quantity);
        self.revenue = self.revenue.saturating_add(sale.revenue());
        self.cost = self.cost.saturating_add(sale.cost());
        self.profit = self.profit.saturating_add(sale.profit());
    }

    /// Arrondi au centime et marge calculée sur le total
    pub fn finish(mut self) -> Self {
        self.average_margin = money(pricing::realized_margin(self.profit, self.cost));
        self.revenue = money(self.revenue);
        self.cost = money(self.cost);
        self.profit = money(self.profit);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub start: NaiveDate,
    #[serde(flatten)]
    pub stats: SaleStats,
}

#[derive(Debug, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub product_count: u64,
    #[serde(flatten)]
    pub stats: SaleStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductBreakdown {
    pub product_id: i32,
    pub product_name: Option<String>,
    pub category_name: Option<String>,
    #[serde(flatten)]
    pub stats: SaleStats,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub period: Bucket,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stats: SaleStats,
    pub series: Vec<SeriesPoint>,
    pub by_category: Vec<CategoryBreakdown>,
    pub by_product: Vec<ProductBreakdown>,
    pub top_products: Vec<ProductBreakdown>,
}

pub struct ReportService;

impl ReportService {
    #[instrument(skip(db))]
    pub async fn generate(
        db: &DatabaseConnection,
        owner_id: i32,
        query: &ReportQuery,
        today: NaiveDate,
    ) -> Result<Report> {
        let bucket = query.period.unwrap_or_default();
        let range = report_range(bucket, query.start, query.end, today)?;

        let mut select = sale::Entity::find()
            .filter(sale::Column::UserId.eq(owner_id))
            .filter(sale::Column::SaleDate.gte(range.start))
            .filter(sale::Column::SaleDate.lt(range.end))
            .find_also_related(product::Entity);
        if let Some(product_id) = query.product_id {
            select = select.filter(sale::Column::ProductId.eq(product_id));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        let sales = select.order_by_asc(sale::Column::SaleDate).all(db).await?;

        let categories = category_names(db, owner_id).await?;
        debug!("Building {:?} report over {} sales", bucket, sales.len());

        build_report(bucket, range, &sales, &categories)
    }
}

/// Noms des catégories de l'utilisateur, indexés par id
pub async fn category_names(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<HashMap<i32, String>> {
    let categories = category::Entity::find()
        .filter(category::Column::UserId.eq(owner_id))
        .all(db)
        .await?;
    Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
}

/// Fenêtre [start, end) à partir des dates inclusives de la requête
pub fn report_range(
    bucket: Bucket,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange> {
    let current = bucket.current_window(today);
    let end = match end {
        Some(end) => end_bound(end)?,
        None => current.end,
    };
    let range = DateRange::new(start.map(midnight).unwrap_or(current.start), end);
    if range.start >= range.end {
        return Err(AppError::validation("end", "End date must be on or after start date"));
    }
    series_starts(bucket, &range)?;
    Ok(range)
}

fn series_starts(bucket: Bucket, range: &DateRange) -> Result<Vec<NaiveDate>> {
    bucket.buckets(range, MAX_BUCKETS).ok_or_else(|| {
        AppError::validation(
            "end",
            format!(
                "Range too large: at most {} points per report, use a coarser period",
                MAX_BUCKETS
            ),
        )
    })
}

pub fn build_report(
    bucket: Bucket,
    range: DateRange,
    sales: &[(sale::Model, Option<product::Model>)],
    categories: &HashMap<i32, String>,
) -> Result<Report> {
    let mut stats = SaleStats::default();
    let mut series: BTreeMap<NaiveDate, SaleStats> = series_starts(bucket, &range)?
        .into_iter()
        .map(|start| (start, SaleStats::default()))
        .collect();
    let mut by_category: HashMap<Option<i32>, (SaleStats, HashSet<i32>)> = HashMap::new();
    let mut by_product: HashMap<i32, (SaleStats, Option<&product::Model>)> = HashMap::new();

    for (sale, product) in sales {
        stats.add(sale);
        series
            .entry(bucket.start_of(sale.sale_date.date()))
            .or_default()
            .add(sale);

        let category_entry = by_category
            .entry(product.as_ref().map(|p| p.category_id))
            .or_default();
        category_entry.0.add(sale);
        category_entry.1.insert(sale.product_id);

        let product_entry = by_product
            .entry(sale.product_id)
            .or_insert_with(|| (SaleStats::default(), product.as_ref()));
        product_entry.0.add(sale);
    }

    let series = series
        .into_iter()
        .map(|(start, stats)| SeriesPoint {
            label: bucket.label(start),
            start,
            stats: stats.finish(),
        })
        .collect();

    let mut by_category: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(category_id, (stats, products))| CategoryBreakdown {
            category_name: category_id.and_then(|id| categories.get(&id).cloned()),
            category_id,
            product_count: products.len() as u64,
            stats: stats.finish(),
        })
        .collect();
    by_category.sort_by(|a, b| {
        b.stats
            .revenue
            .cmp(&a.stats.revenue)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    let by_product = rank_products(by_product.into_iter().map(|(product_id, (stats, product))| {
        ProductBreakdown {
            product_id,
            product_name: product.map(|p| p.name.clone()),
            category_name: product.and_then(|p| categories.get(&p.category_id).cloned()),
            stats: stats.finish(),
        }
    }));
    let top_products = by_product.iter().take(TOP_PRODUCTS).cloned().collect();

    Ok(Report {
        period: bucket,
        start: range.start.date(),
        end: range.end.date().pred_opt().unwrap_or(range.start.date()),
        stats: stats.finish(),
        series,
        by_category,
        by_product,
        top_products,
    })
}

/// Tri par chiffre d'affaires décroissant, puis par nom
pub fn rank_products(products: impl Iterator<Item = ProductBreakdown>) -> Vec<ProductBreakdown> {
    let mut ranked: Vec<ProductBreakdown> = products.collect();
    ranked.sort_by(|a, b| {
        b.stats
            .revenue
            .cmp(&a.stats.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked
}
