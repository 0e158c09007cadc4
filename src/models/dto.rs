// DTO des requêtes / réponses API
use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::expense::{ExpenseCategory, ExpenseStatus};
use crate::models::{category, expense, product, sale};
use crate::services::pricing::{self, money};

// ----------------------------------------------------------------------------
// Validation des montants (validator ne gère pas Decimal nativement)
// ----------------------------------------------------------------------------

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Coût unitaire: 0 ..= 99 999 999.99
fn validate_unit_cost(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > pricing::max_unit_value() {
        return Err(invalid("range", "must be between 0 and 99999999.99"));
    }
    Ok(())
}

/// Quantité vendue: > 0 et ≤ 99 999 999.99
fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(invalid("range", "must be greater than zero"));
    }
    if *value > pricing::max_unit_value() {
        return Err(invalid("range", "must be at most 99999999.99"));
    }
    Ok(())
}

/// Montant d'une dépense: 0 ..= 9 999 999 999.99
fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > pricing::max_amount() {
        return Err(invalid("range", "must be between 0 and 9999999999.99"));
    }
    Ok(())
}

fn validate_margin(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > pricing::max_margin() {
        return Err(invalid("range", "must be between 0 and 999.99"));
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "this field is required"));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Pagination
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Découpe `items` (déjà filtrés et triés) pour la page demandée (1-based).
    /// Une page hors limites renvoie la dernière page.
    pub fn from_items(items: Vec<T>, page: Option<u64>, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len() as u64;
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = page.unwrap_or(1).clamp(1, total_pages);

        let start = ((page - 1) * per_page) as usize;
        let items: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Page {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

/// Raccourcis de période des listes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPeriod {
    Today,
    Week,
    Month,
    Year,
}

// ----------------------------------------------------------------------------
// Catégories
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        CategoryResponse {
            id: c.id,
            name: c.name,
            description: c.description,
            active: c.active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ----------------------------------------------------------------------------
// Produits et prix
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_unit_cost"))]
    pub base_cost: Decimal,
    #[validate(custom(function = "validate_margin"))]
    pub margin_percent: Option<Decimal>,
    pub category_id: i32,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<i32>,
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub base_cost: Decimal,
    pub margin_percent: Decimal,
    pub final_price: Decimal,
    pub profit: Decimal,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProductResponse {
    pub fn new(p: product::Model, category: Option<category::Model>) -> Self {
        ProductResponse {
            final_price: money(p.final_price()),
            profit: money(p.profit()),
            id: p.id,
            name: p.name,
            description: p.description,
            category_id: p.category_id,
            category_name: category.map(|c| c.name),
            base_cost: money(p.base_cost),
            margin_percent: money(p.margin_percent),
            active: p.active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PriceSimulationRequest {
    pub product_id: i32,
    #[validate(custom(function = "validate_margin"))]
    pub margin: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PriceSimulationResponse {
    pub product_id: i32,
    pub base_cost: Decimal,
    pub margin: Decimal,
    pub price: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ProductPriceQuery {
    pub product_id: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductPriceResponse {
    pub product_id: i32,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub margin: Decimal,
}

// ----------------------------------------------------------------------------
// Ventes
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SaleRequest {
    pub product_id: i32,
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    pub sale_date: Option<NaiveDateTime>, // défaut: maintenant
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleListQuery {
    pub product_id: Option<i32>,
    pub category_id: Option<i32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub period: Option<ListPeriod>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: Option<String>,
    pub category_id: Option<i32>,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub realized_margin: Decimal,
    pub sale_date: NaiveDateTime,
    pub notes: Option<String>,
}

impl SaleResponse {
    pub fn new(s: sale::Model, product: Option<product::Model>) -> Self {
        SaleResponse {
            revenue: money(s.revenue()),
            cost: money(s.cost()),
            profit: money(s.profit()),
            realized_margin: money(s.realized_margin()),
            id: s.id,
            product_id: s.product_id,
            product_name: product.as_ref().map(|p| p.name.clone()),
            category_id: product.as_ref().map(|p| p.category_id),
            quantity: s.quantity,
            unit_cost: money(s.unit_cost),
            unit_price: money(s.unit_price),
            sale_date: s.sale_date,
            notes: s.notes,
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SaleTotals {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    #[serde(flatten)]
    pub page: Page<SaleResponse>,
    pub totals: SaleTotals,
}

// ----------------------------------------------------------------------------
// Dépenses
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ExpenseRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub description: String,
    pub category: ExpenseCategory,
    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,
    pub incurred_at: Option<NaiveDateTime>, // défaut: maintenant
    pub due_date: Option<NaiveDate>,
    pub paid: Option<bool>,
    pub recurring: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    pub category: Option<ExpenseCategory>,
    pub status: Option<ExpenseStatus>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub period: Option<ListPeriod>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: i32,
    pub description: String,
    pub category: ExpenseCategory,
    pub category_label: &'static str,
    pub amount: Decimal,
    pub incurred_at: NaiveDateTime,
    pub due_date: Option<NaiveDate>,
    pub paid: bool,
    pub paid_at: Option<NaiveDateTime>,
    pub status: ExpenseStatus,
    pub recurring: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ExpenseResponse {
    pub fn new(e: expense::Model, today: NaiveDate) -> Self {
        ExpenseResponse {
            status: e.status_on(today),
            category_label: e.category.label(),
            amount: money(e.amount),
            id: e.id,
            description: e.description,
            category: e.category,
            incurred_at: e.incurred_at,
            due_date: e.due_date,
            paid: e.paid,
            paid_at: e.paid_at,
            recurring: e.recurring,
            notes: e.notes,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct ExpenseTotals {
    pub total: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    #[serde(flatten)]
    pub page: Page<ExpenseResponse>,
    pub totals: ExpenseTotals,
}
