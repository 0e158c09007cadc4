// ============================================================================
// SERVICE : TABLEAU DE BORD ET RÉSUMÉ D'ACCUEIL
// ============================================================================
//
// Description:
//   Indicateurs sur une fenêtre glissante (30j, 90j, 6m, 12m se terminant
//   maintenant), comparés à la fenêtre précédente de même durée.
//
// Règles:
//   - net_profit = profit brut des ventes - total des dépenses de la fenêtre
//     (payées ou non, datées par incurred_at)
//   - average_margin = profit brut / chiffre d'affaires × 100
//   - le flux de trésorerie quotidien compte les dépenses par paid_at
//   - percent_change = null quand la valeur précédente vaut 0
//
// ============================================================================

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::Result;
use crate::models::dto::{ExpenseResponse, ProductResponse, SaleResponse};
use crate::models::expense::{self, ExpenseCategory};
use crate::models::{category, product, sale};
use crate::services::period::{midnight, Bucket, DateRange};
use crate::services::pricing::{self, money};
use crate::services::report_service::{category_names, rank_products, ProductBreakdown, SaleStats};

const TOP_PRODUCTS: usize = 10;
const EVOLUTION_MONTHS: u32 = 12;
const CASH_FLOW_DAYS: i64 = 30;
const RECENT_ITEMS: u64 = 5;
const LOW_MARGIN_PERCENT: i64 = 20;
const REVENUE_DROP_PERCENT: i64 = -10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardWindow {
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "6m")]
    Last6Months,
    #[default]
    #[serde(rename = "12m")]
    Last12Months,
}

impl DashboardWindow {
    pub fn days(self) -> i64 {
        match self {
            DashboardWindow::Last30Days => 30,
            DashboardWindow::Last90Days => 90,
            DashboardWindow::Last6Months => 180,
            DashboardWindow::Last12Months => 365,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub window: Option<DashboardWindow>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub revenue: Decimal,
    pub gross_profit: Decimal,
    pub expenses_total: Decimal,
    pub expenses_paid: Decimal,
    pub net_profit: Decimal,
    pub sale_count: u64,
    pub average_ticket: Decimal,
    pub average_margin: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MonthPoint {
    pub label: String,
    pub month: NaiveDate,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CashFlowDay {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ExpenseCategoryTotal {
    pub category: ExpenseCategory,
    pub label: &'static str,
    pub total: Decimal,
    pub count: u64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Trend {
    pub current: Decimal,
    pub previous: Decimal,
    pub delta: Decimal,
    pub percent_change: Option<Decimal>,
}

impl Trend {
    pub fn new(current: Decimal, previous: Decimal) -> Self {
        Trend {
            current: money(current),
            previous: money(previous),
            delta: money(current.saturating_sub(previous)),
            percent_change: pricing::percent_change(current, previous).map(money),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Trends {
    pub revenue: Trend,
    pub expenses: Trend,
    pub net_profit: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OverdueExpenses,
    LowMargin,
    RevenueDrop,
}

#[derive(Debug, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub window: DashboardWindow,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub kpis: Kpis,
    pub monthly: Vec<MonthPoint>,
    pub cash_flow: Vec<CashFlowDay>,
    pub top_products: Vec<ProductBreakdown>,
    pub expenses_by_category: Vec<ExpenseCategoryTotal>,
    pub trends: Trends,
    pub alerts: Vec<Alert>,
}

/// Dépenses impayées dont l'échéance est passée (toutes dates confondues)
#[derive(Debug, Default, Clone, Copy)]
pub struct Overdue {
    pub count: u64,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SummaryCounts {
    pub active_products: u64,
    pub active_categories: u64,
    pub sales: u64,
    pub expenses: u64,
}

#[derive(Debug, Serialize)]
pub struct MonthFigures {
    pub month: NaiveDate,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub expenses_total: Decimal,
    pub expenses_paid: Decimal,
    pub expenses_pending: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub counts: SummaryCounts,
    pub current_month: MonthFigures,
    pub recent_products: Vec<ProductResponse>,
    pub recent_sales: Vec<SaleResponse>,
    pub recent_expenses: Vec<ExpenseResponse>,
}

pub struct DashboardService;

impl DashboardService {
    #[instrument(skip(db))]
    pub async fn dashboard(
        db: &DatabaseConnection,
        owner_id: i32,
        window: DashboardWindow,
        now: NaiveDateTime,
    ) -> Result<Dashboard> {
        let range = DateRange::trailing_days(now, window.days());
        let since = earliest_needed(range, now);

        let sales = sale::Entity::find()
            .filter(sale::Column::UserId.eq(owner_id))
            .filter(sale::Column::SaleDate.gte(since))
            .filter(sale::Column::SaleDate.lt(now))
            .find_also_related(product::Entity)
            .all(db)
            .await?;

        let expenses = expense::Entity::find()
            .filter(expense::Column::UserId.eq(owner_id))
            .filter(
                Condition::any()
                    .add(expense::Column::IncurredAt.gte(since))
                    .add(expense::Column::PaidAt.gte(since)),
            )
            .all(db)
            .await?;

        let overdue_rows = expense::Entity::find()
            .filter(expense::Column::UserId.eq(owner_id))
            .filter(expense::Column::Paid.eq(false))
            .filter(expense::Column::DueDate.lt(now.date()))
            .all(db)
            .await?;
        let overdue = Overdue {
            count: overdue_rows.len() as u64,
            total: money(overdue_rows.iter().map(|e| e.amount).sum()),
        };

        let categories = category_names(db, owner_id).await?;
        debug!(
            "Dashboard over {} sales and {} expenses",
            sales.len(),
            expenses.len()
        );

        Ok(build_dashboard(window, now, &sales, &expenses, overdue, &categories))
    }

    /// Résumé de la page d'accueil: compteurs, mois en cours, derniers ajouts
    #[instrument(skip(db))]
    pub async fn summary(
        db: &DatabaseConnection,
        owner_id: i32,
        now: NaiveDateTime,
    ) -> Result<Summary> {
        let today = now.date();
        let counts = SummaryCounts {
            active_products: product::Entity::find()
                .filter(product::Column::UserId.eq(owner_id))
                .filter(product::Column::Active.eq(true))
                .count(db)
                .await?,
            active_categories: category::Entity::find()
                .filter(category::Column::UserId.eq(owner_id))
                .filter(category::Column::Active.eq(true))
                .count(db)
                .await?,
            sales: sale::Entity::find()
                .filter(sale::Column::UserId.eq(owner_id))
                .count(db)
                .await?,
            expenses: expense::Entity::find()
                .filter(expense::Column::UserId.eq(owner_id))
                .count(db)
                .await?,
        };

        let month = Bucket::Month.current_window(today);
        let month_sales = sale::Entity::find()
            .filter(sale::Column::UserId.eq(owner_id))
            .filter(sale::Column::SaleDate.gte(month.start))
            .filter(sale::Column::SaleDate.lt(month.end))
            .all(db)
            .await?;
        let month_expenses = expense::Entity::find()
            .filter(expense::Column::UserId.eq(owner_id))
            .filter(expense::Column::IncurredAt.gte(month.start))
            .filter(expense::Column::IncurredAt.lt(month.end))
            .all(db)
            .await?;
        let current_month = month_figures(month.start.date(), &month_sales, &month_expenses);

        let recent_products = product::Entity::find()
            .filter(product::Column::UserId.eq(owner_id))
            .find_also_related(category::Entity)
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .limit(RECENT_ITEMS)
            .all(db)
            .await?
            .into_iter()
            .map(|(p, c)| ProductResponse::new(p, c))
            .collect();

        let recent_sales = sale::Entity::find()
            .filter(sale::Column::UserId.eq(owner_id))
            .find_also_related(product::Entity)
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .limit(RECENT_ITEMS)
            .all(db)
            .await?
            .into_iter()
            .map(|(s, p)| SaleResponse::new(s, p))
            .collect();

        let recent_expenses = expense::Entity::find()
            .filter(expense::Column::UserId.eq(owner_id))
            .order_by_desc(expense::Column::IncurredAt)
            .order_by_desc(expense::Column::Id)
            .limit(RECENT_ITEMS)
            .all(db)
            .await?
            .into_iter()
            .map(|e| ExpenseResponse::new(e, today))
            .collect();

        Ok(Summary {
            counts,
            current_month,
            recent_products,
            recent_sales,
            recent_expenses,
        })
    }
}

/// Première date dont le tableau de bord a besoin (fenêtre précédente,
/// évolution sur 12 mois, flux de trésorerie)
fn earliest_needed(range: DateRange, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let evolution = midnight(evolution_start(today));
    let cash_flow = midnight(today - Duration::days(CASH_FLOW_DAYS - 1));
    range.previous().start.min(evolution).min(cash_flow)
}

fn evolution_start(today: NaiveDate) -> NaiveDate {
    Bucket::Month.start_of(today) - Months::new(EVOLUTION_MONTHS - 1)
}

fn sales_in<'a>(
    range: DateRange,
    sales: &'a [(sale::Model, Option<product::Model>)],
) -> impl Iterator<Item = &'a (sale::Model, Option<product::Model>)> {
    sales.iter().filter(move |(s, _)| range.contains(s.sale_date))
}

fn expenses_in(range: DateRange, expenses: &[expense::Model]) -> impl Iterator<Item = &expense::Model> {
    expenses.iter().filter(move |e| range.contains(e.incurred_at))
}

fn kpis(range: DateRange, sales: &[(sale::Model, Option<product::Model>)], expenses: &[expense::Model]) -> Kpis {
    let mut stats = SaleStats::default();
    for (s, _) in sales_in(range, sales) {
        stats.add(s);
    }

    let mut expenses_total = Decimal::ZERO;
    let mut expenses_paid = Decimal::ZERO;
    for e in expenses_in(range, expenses) {
        expenses_total += e.amount;
        if e.paid {
            expenses_paid += e.amount;
        }
    }

    let average_ticket = if stats.sale_count == 0 {
        Decimal::ZERO
    } else {
        stats.revenue / Decimal::from(stats.sale_count)
    };

    Kpis {
        revenue: money(stats.revenue),
        gross_profit: money(stats.profit),
        expenses_total: money(expenses_total),
        expenses_paid: money(expenses_paid),
        net_profit: money(stats.profit.saturating_sub(expenses_total)),
        sale_count: stats.sale_count,
        average_ticket: money(average_ticket),
        average_margin: money(pricing::ratio_percent(stats.profit, stats.revenue)),
    }
}

fn month_figures(
    month: NaiveDate,
    sales: &[sale::Model],
    expenses: &[expense::Model],
) -> MonthFigures {
    let mut stats = SaleStats::default();
    sales.iter().for_each(|s| stats.add(s));
    let expenses_total: Decimal = expenses.iter().map(|e| e.amount).sum();
    let expenses_paid: Decimal = expenses.iter().filter(|e| e.paid).map(|e| e.amount).sum();

    MonthFigures {
        month,
        revenue: money(stats.revenue),
        profit: money(stats.profit),
        expenses_total: money(expenses_total),
        expenses_paid: money(expenses_paid),
        expenses_pending: money(expenses_total - expenses_paid),
        net_profit: money(stats.profit.saturating_sub(expenses_total)),
    }
}

fn monthly_evolution(
    today: NaiveDate,
    sales: &[(sale::Model, Option<product::Model>)],
    expenses: &[expense::Model],
) -> Vec<MonthPoint> {
    let start = evolution_start(today);
    let mut months: BTreeMap<NaiveDate, (SaleStats, Decimal)> = (0..EVOLUTION_MONTHS)
        .map(|offset| (start + Months::new(offset), (SaleStats::default(), Decimal::ZERO)))
        .collect();

    for (s, _) in sales {
        if let Some(entry) = months.get_mut(&Bucket::Month.start_of(s.sale_date.date())) {
            entry.0.add(s);
        }
    }
    for e in expenses {
        if let Some(entry) = months.get_mut(&Bucket::Month.start_of(e.incurred_at.date())) {
            entry.1 += e.amount;
        }
    }

    months
        .into_iter()
        .map(|(month, (stats, expenses))| MonthPoint {
            label: Bucket::Month.label(month),
            month,
            revenue: money(stats.revenue),
            profit: money(stats.profit),
            expenses: money(expenses),
            net_profit: money(stats.profit.saturating_sub(expenses)),
        })
        .collect()
}

/// Entrées (ventes) et sorties (dépenses payées ce jour-là) des 30 derniers jours
fn cash_flow(
    today: NaiveDate,
    sales: &[(sale::Model, Option<product::Model>)],
    expenses: &[expense::Model],
) -> Vec<CashFlowDay> {
    let first = today - Duration::days(CASH_FLOW_DAYS - 1);
    let mut days: BTreeMap<NaiveDate, (Decimal, Decimal)> = (0..CASH_FLOW_DAYS)
        .map(|offset| (first + Duration::days(offset), (Decimal::ZERO, Decimal::ZERO)))
        .collect();

    for (s, _) in sales {
        if let Some(entry) = days.get_mut(&s.sale_date.date()) {
            entry.0 = entry.0.saturating_add(s.revenue());
        }
    }
    for e in expenses.iter().filter(|e| e.paid) {
        if let Some(entry) = e.paid_at.and_then(|paid_at| days.get_mut(&paid_at.date())) {
            entry.1 += e.amount;
        }
    }

    days.into_iter()
        .map(|(date, (revenue, expenses))| CashFlowDay {
            date,
            revenue: money(revenue),
            expenses: money(expenses),
            balance: money(revenue.saturating_sub(expenses)),
        })
        .collect()
}

fn top_products(
    range: DateRange,
    sales: &[(sale::Model, Option<product::Model>)],
    categories: &HashMap<i32, String>,
) -> Vec<ProductBreakdown> {
    let mut per_product: HashMap<i32, (SaleStats, Option<&product::Model>)> = HashMap::new();
    for (s, p) in sales_in(range, sales) {
        per_product
            .entry(s.product_id)
            .or_insert_with(|| (SaleStats::default(), p.as_ref()))
            .0
            .add(s);
    }

    let mut ranked = rank_products(per_product.into_iter().map(|(product_id, (stats, p))| {
        ProductBreakdown {
            product_id,
            product_name: p.map(|p| p.name.clone()),
            category_name: p.and_then(|p| categories.get(&p.category_id).cloned()),
            stats: stats.finish(),
        }
    }));
    ranked.truncate(TOP_PRODUCTS);
    ranked
}

fn expenses_by_category(range: DateRange, expenses: &[expense::Model]) -> Vec<ExpenseCategoryTotal> {
    let mut totals: HashMap<ExpenseCategory, (Decimal, u64)> = HashMap::new();
    for e in expenses_in(range, expenses) {
        let entry = totals.entry(e.category).or_default();
        entry.0 += e.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<ExpenseCategoryTotal> = totals
        .into_iter()
        .map(|(category, (total, count))| ExpenseCategoryTotal {
            category,
            label: category.label(),
            total: money(total),
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(b.label)));
    totals
}

fn alerts(kpis: &Kpis, revenue_trend: &Trend, overdue: Overdue) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if overdue.count > 0 {
        alerts.push(Alert {
            kind: AlertKind::OverdueExpenses,
            message: format!(
                "{} overdue expense(s) totaling {}",
                overdue.count, overdue.total
            ),
        });
    }
    if kpis.revenue > Decimal::ZERO && kpis.average_margin < Decimal::from(LOW_MARGIN_PERCENT) {
        alerts.push(Alert {
            kind: AlertKind::LowMargin,
            message: format!("Average margin is {}%, below {}%", kpis.average_margin, LOW_MARGIN_PERCENT),
        });
    }
    if let Some(change) = revenue_trend.percent_change {
        if change < Decimal::from(REVENUE_DROP_PERCENT) {
            alerts.push(Alert {
                kind: AlertKind::RevenueDrop,
                message: format!("Revenue changed by {}% versus the previous period", change),
            });
        }
    }

    alerts
}

pub fn build_dashboard(
    window: DashboardWindow,
    now: NaiveDateTime,
    sales: &[(sale::Model, Option<product::Model>)],
    expenses: &[expense::Model],
    overdue: Overdue,
    categories: &HashMap<i32, String>,
) -> Dashboard {
    let today = now.date();
    let range = DateRange::trailing_days(now, window.days());
    let previous_range = range.previous();

    let current = kpis(range, sales, expenses);
    let previous = kpis(previous_range, sales, expenses);
    let trends = Trends {
        revenue: Trend::new(current.revenue, previous.revenue),
        expenses: Trend::new(current.expenses_total, previous.expenses_total),
        net_profit: Trend::new(current.net_profit, previous.net_profit),
    };
    let alerts = alerts(&current, &trends.revenue, overdue);

    Dashboard {
        window,
        start: range.start,
        end: range.end,
        monthly: monthly_evolution(today, sales, expenses),
        cash_flow: cash_flow(today, sales, expenses),
        top_products: top_products(range, sales, categories),
        expenses_by_category: expenses_by_category(range, expenses),
        kpis: current,
        trends,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{create_user, setup_test_db};
    use crate::models::dto::{CategoryRequest, ExpenseRequest, ProductRequest, SaleRequest};
    use crate::services::category_service::CategoryService;
    use crate::services::expense_service::ExpenseService;
    use crate::services::product_service::ProductService;
    use crate::services::sale_service::SaleService;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn product_model(id: i32, cost: &str, margin: &str) -> product::Model {
        product::Model {
            id,
            user_id: 1,
            category_id: 1,
            name: format!("Product {}", id),
            description: None,
            base_cost: dec(cost),
            margin_percent: dec(margin),
            active: true,
            created_at: at(2024, 1, 1),
            updated_at: at(2024, 1, 1),
        }
    }

    fn sale_of(id: i32, product: &product::Model, quantity: &str, when: NaiveDateTime) -> (sale::Model, Option<product::Model>) {
        (
            sale::Model {
                id,
                user_id: 1,
                product_id: product.id,
                quantity: dec(quantity),
                unit_cost: product.base_cost,
                unit_price: product.final_price(),
                sale_date: when,
                notes: None,
                created_at: when,
                updated_at: when,
            },
            Some(product.clone()),
        )
    }

    fn expense_of(id: i32, amount: &str, incurred_at: NaiveDateTime, paid_at: Option<NaiveDateTime>) -> expense::Model {
        expense::Model {
            id,
            user_id: 1,
            description: format!("Expense {}", id),
            category: ExpenseCategory::Operational,
            amount: dec(amount),
            incurred_at,
            due_date: None,
            paid: paid_at.is_some(),
            paid_at,
            recurring: false,
            notes: None,
            created_at: incurred_at,
            updated_at: incurred_at,
        }
    }

    #[test]
    fn test_window_days() {
        assert_eq!(DashboardWindow::Last30Days.days(), 30);
        assert_eq!(DashboardWindow::Last6Months.days(), 180);
        assert_eq!(DashboardWindow::default(), DashboardWindow::Last12Months);
        let parsed: DashboardWindow = serde_json::from_str("\"90d\"").unwrap();
        assert_eq!(parsed, DashboardWindow::Last90Days);
    }

    #[test]
    fn test_trend_handles_zero_and_negative_previous() {
        let trend = Trend::new(dec("150"), Decimal::ZERO);
        assert_eq!(trend.percent_change, None);
        assert_eq!(trend.delta.to_string(), "150.00");

        let trend = Trend::new(dec("-50"), dec("-100"));
        assert_eq!(trend.percent_change.map(|p| p.to_string()), Some("50.00".to_string()));

        // écarts hors de portée de Decimal: saturés
        let trend = Trend::new(Decimal::MAX, Decimal::MIN);
        assert_eq!(trend.delta, money(Decimal::MAX));
        assert_eq!(trend.percent_change, None);
    }

    #[test]
    fn test_net_profit_subtracts_all_expenses_in_window() {
        let now = at(2024, 6, 30);
        let product = product_model(1, "100", "25");
        let sales = vec![
            sale_of(1, &product, "3", at(2024, 6, 10)),
            sale_of(2, &product, "1", at(2024, 6, 20)),
            // hors fenêtre 30j
            sale_of(3, &product, "10", at(2024, 4, 1)),
        ];
        let expenses = vec![
            expense_of(1, "40", at(2024, 6, 5), None),
            expense_of(2, "10", at(2024, 6, 6), Some(at(2024, 6, 6))),
        ];

        let dashboard = build_dashboard(
            DashboardWindow::Last30Days,
            now,
            &sales,
            &expenses,
            Overdue::default(),
            &HashMap::new(),
        );
        let kpis = &dashboard.kpis;
        assert_eq!(kpis.revenue.to_string(), "500.00");
        assert_eq!(kpis.gross_profit.to_string(), "100.00");
        assert_eq!(kpis.expenses_total.to_string(), "50.00");
        assert_eq!(kpis.expenses_paid.to_string(), "10.00");
        assert_eq!(kpis.net_profit.to_string(), "50.00");
        assert_eq!(kpis.sale_count, 2);
        assert_eq!(kpis.average_ticket.to_string(), "250.00");
        assert_eq!(kpis.average_margin.to_string(), "20.00");

        assert_eq!(dashboard.cash_flow.len(), 30);
        let june_6 = dashboard
            .cash_flow
            .iter()
            .find(|d| d.date == NaiveDate::from_ymd_opt(2024, 6, 6).unwrap())
            .unwrap();
        assert_eq!(june_6.expenses.to_string(), "10.00");
        assert_eq!(june_6.balance.to_string(), "-10.00");

        assert_eq!(dashboard.monthly.len(), 12);
        let last = dashboard.monthly.last().unwrap();
        assert_eq!(last.month, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(last.net_profit.to_string(), "50.00");
        let april = &dashboard.monthly[9];
        assert_eq!(april.revenue.to_string(), "1250.00");

        // aucune vente dans la fenêtre précédente
        assert_eq!(dashboard.trends.revenue.percent_change, None);
        assert!(dashboard.alerts.is_empty());
    }

    #[test]
    fn test_alerts() {
        let now = at(2024, 6, 30);
        let thin = product_model(1, "100", "10");
        let sales = vec![
            sale_of(1, &thin, "1", at(2024, 6, 15)),
            sale_of(2, &thin, "5", at(2024, 5, 15)),
        ];

        let dashboard = build_dashboard(
            DashboardWindow::Last30Days,
            now,
            &sales,
            &[],
            Overdue { count: 2, total: dec("300") },
            &HashMap::new(),
        );
        let kinds: Vec<_> = dashboard.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::OverdueExpenses, AlertKind::LowMargin, AlertKind::RevenueDrop]
        );
        assert_eq!(
            dashboard.trends.revenue.percent_change.map(|p| p.to_string()),
            Some("-80.00".to_string())
        );
    }

    #[tokio::test]
    async fn test_dashboard_and_summary_from_database() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;
        let other = create_user(&db, "bob").await;

        let category = CategoryService::create(
            &db,
            owner,
            CategoryRequest {
                name: "Services".to_string(),
                description: None,
                active: None,
            },
        )
        .await
        .unwrap();
        let product = ProductService::create(
            &db,
            owner,
            ProductRequest {
                name: "Consulting".to_string(),
                description: None,
                base_cost: dec("100"),
                margin_percent: Some(dec("25")),
                category_id: category.id,
                active: None,
            },
        )
        .await
        .unwrap();
        SaleService::create(
            &db,
            owner,
            SaleRequest {
                product_id: product.id,
                quantity: dec("3"),
                sale_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        ExpenseService::create(
            &db,
            owner,
            ExpenseRequest {
                description: "Rent".to_string(),
                category: ExpenseCategory::Operational,
                amount: dec("30"),
                incurred_at: None,
                due_date: None,
                paid: None,
                recurring: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        // les ventes et dépenses sont datées "maintenant": on regarde juste après
        let later = crate::services::now() + Duration::seconds(5);
        let dashboard = DashboardService::dashboard(&db, owner, DashboardWindow::Last30Days, later)
            .await
            .unwrap();
        assert_eq!(dashboard.kpis.revenue.to_string(), "375.00");
        assert_eq!(dashboard.kpis.net_profit.to_string(), "45.00");
        assert_eq!(dashboard.top_products[0].category_name.as_deref(), Some("Services"));

        let empty = DashboardService::dashboard(&db, other, DashboardWindow::Last30Days, later)
            .await
            .unwrap();
        assert_eq!(empty.kpis, Kpis::default());

        let summary = DashboardService::summary(&db, owner, later).await.unwrap();
        assert_eq!(summary.counts.active_products, 1);
        assert_eq!(summary.counts.sales, 1);
        assert_eq!(summary.current_month.expenses_pending.to_string(), "30.00");
        assert_eq!(summary.recent_sales.len(), 1);
        assert_eq!(summary.recent_expenses[0].description, "Rent");
    }
}
