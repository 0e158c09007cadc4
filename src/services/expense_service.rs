use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::*;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::dto::{
    ExpenseListQuery, ExpenseListResponse, ExpenseRequest, ExpenseResponse, ExpenseTotals, Page,
};
use crate::models::expense::{self, ExpenseStatus};
use crate::services::period::{end_bound, list_period_start, midnight};
use crate::services::pricing::money;
use crate::services::{clean_optional, now, text_matches};

const PER_PAGE: u64 = 15;

pub struct ExpenseService;

impl ExpenseService {
    #[instrument(skip(db))]
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        request: ExpenseRequest,
    ) -> Result<ExpenseResponse> {
        request.validate()?;
        let stamp = now();
        let paid = request.paid.unwrap_or(false);
        check_due_date(paid, request.due_date, stamp.date())?;

        let expense = expense::ActiveModel {
            user_id: Set(owner_id),
            description: Set(request.description.trim().to_string()),
            category: Set(request.category),
            amount: Set(request.amount),
            incurred_at: Set(request.incurred_at.unwrap_or(stamp)),
            due_date: Set(request.due_date),
            paid: Set(paid),
            paid_at: Set(paid_stamp(paid, None, stamp)),
            recurring: Set(request.recurring.unwrap_or(false)),
            notes: Set(clean_optional(request.notes)),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("Expense {} recorded for user {}", expense.id, owner_id);
        Ok(ExpenseResponse::new(expense, stamp.date()))
    }

    pub async fn get(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<ExpenseResponse> {
        let expense = Self::find_owned(db, owner_id, id).await?;
        Ok(ExpenseResponse::new(expense, now().date()))
    }

    async fn find_owned(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<expense::Model> {
        expense::Entity::find_by_id(id)
            .filter(expense::Column::UserId.eq(owner_id))
            .one(db)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn update(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
        request: ExpenseRequest,
    ) -> Result<ExpenseResponse> {
        request.validate()?;
        let existing = Self::find_owned(db, owner_id, id).await?;
        let stamp = now();
        let paid = request.paid.unwrap_or(existing.paid);
        check_due_date(paid, request.due_date, stamp.date())?;

        let mut expense: expense::ActiveModel = existing.clone().into();
        expense.description = Set(request.description.trim().to_string());
        expense.category = Set(request.category);
        expense.amount = Set(request.amount);
        expense.incurred_at = Set(request.incurred_at.unwrap_or(existing.incurred_at));
        expense.due_date = Set(request.due_date);
        expense.paid = Set(paid);
        expense.paid_at = Set(paid_stamp(paid, existing.paid_at, stamp));
        expense.recurring = Set(request.recurring.unwrap_or(existing.recurring));
        expense.notes = Set(clean_optional(request.notes));
        expense.updated_at = Set(stamp);
        let expense = expense.update(db).await?;

        info!("Expense {} updated", id);
        Ok(ExpenseResponse::new(expense, stamp.date()))
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &DatabaseConnection, owner_id: i32, id: i32) -> Result<()> {
        let expense = Self::find_owned(db, owner_id, id).await?;
        expense.delete(db).await?;
        info!("Expense {} deleted", id);
        Ok(())
    }

    /// Pending/Overdue → Paid. Une dépense déjà payée est renvoyée telle quelle.
    #[instrument(skip(db))]
    pub async fn mark_paid(
        db: &DatabaseConnection,
        owner_id: i32,
        id: i32,
    ) -> Result<ExpenseResponse> {
        let existing = Self::find_owned(db, owner_id, id).await?;
        let stamp = now();
        if existing.paid {
            debug!("Expense {} already paid", id);
            return Ok(ExpenseResponse::new(existing, stamp.date()));
        }

        let mut expense: expense::ActiveModel = existing.into();
        expense.paid = Set(true);
        expense.paid_at = Set(Some(stamp));
        expense.updated_at = Set(stamp);
        let expense = expense.update(db).await?;

        info!("Expense {} marked as paid", id);
        Ok(ExpenseResponse::new(expense, stamp.date()))
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &DatabaseConnection,
        owner_id: i32,
        query: &ExpenseListQuery,
    ) -> Result<ExpenseListResponse> {
        let stamp = now();
        let today = stamp.date();
        let mut select = expense::Entity::find().filter(expense::Column::UserId.eq(owner_id));

        if let Some(category) = query.category {
            select = select.filter(expense::Column::Category.eq(category));
        }
        if let Some(status) = query.status {
            select = select.filter(status_condition(status, today));
        }
        if let Some(start) = query.start {
            select = select.filter(expense::Column::IncurredAt.gte(midnight(start)));
        }
        if let Some(end) = query.end {
            select = select.filter(expense::Column::IncurredAt.lt(end_bound(end)?));
        }
        if let Some(period) = query.period {
            select = select.filter(expense::Column::IncurredAt.gte(list_period_start(period, stamp)));
        }
        let search = clean_optional(query.search.clone());

        let rows: Vec<expense::Model> = select
            .order_by_desc(expense::Column::IncurredAt)
            .order_by_desc(expense::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter(|e| {
                search
                    .as_deref()
                    .is_none_or(|s| {
                        text_matches(s, &[Some(e.description.as_str()), e.notes.as_deref()])
                    })
            })
            .collect();
        debug!("{} expenses matched", rows.len());

        let totals = totals(&rows);
        let items = rows
            .into_iter()
            .map(|e| ExpenseResponse::new(e, today))
            .collect();

        Ok(ExpenseListResponse {
            page: Page::from_items(items, query.page, query.per_page.unwrap_or(PER_PAGE)),
            totals,
        })
    }
}

/// Une dépense payée ne peut pas avoir d'échéance future
fn check_due_date(paid: bool, due_date: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    match due_date {
        Some(due) if paid && due > today => Err(AppError::validation(
            "due_date",
            "A paid expense cannot have a future due date",
        )),
        _ => Ok(()),
    }
}

/// paid et paid_at vont ensemble: on garde la date existante, sinon maintenant
fn paid_stamp(
    paid: bool,
    existing: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if paid {
        existing.or(Some(now))
    } else {
        None
    }
}

/// Même règle que expense::Model::status_on, traduite en SQL
fn status_condition(status: ExpenseStatus, today: NaiveDate) -> Condition {
    match status {
        ExpenseStatus::Paid => Condition::all().add(expense::Column::Paid.eq(true)),
        ExpenseStatus::Overdue => Condition::all()
            .add(expense::Column::Paid.eq(false))
            .add(expense::Column::DueDate.lt(today)),
        ExpenseStatus::Pending => Condition::all()
            .add(expense::Column::Paid.eq(false))
            .add(
                Condition::any()
                    .add(expense::Column::DueDate.is_null())
                    .add(expense::Column::DueDate.gte(today)),
            ),
    }
}

pub fn totals(expenses: &[expense::Model]) -> ExpenseTotals {
    let mut totals = ExpenseTotals::default();
    for e in expenses {
        totals.total += e.amount;
        if e.paid {
            totals.paid += e.amount;
        }
        totals.count += 1;
    }
    totals.pending = money(totals.total - totals.paid);
    totals.total = money(totals.total);
    totals.paid = money(totals.paid);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{create_user, setup_test_db};
    use crate::models::expense::ExpenseCategory;
    use crate::services::today;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn request(description: &str, amount: &str) -> ExpenseRequest {
        ExpenseRequest {
            description: description.to_string(),
            category: ExpenseCategory::Operational,
            amount: dec(amount),
            incurred_at: None,
            due_date: None,
            paid: None,
            recurring: None,
            notes: None,
        }
    }

    fn list_query() -> ExpenseListQuery {
        ExpenseListQuery {
            category: None,
            status: None,
            start: None,
            end: None,
            period: None,
            search: None,
            page: None,
            per_page: None,
        }
    }

    #[test]
    fn test_paid_stamp_keeps_existing_date() {
        let earlier = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(paid_stamp(true, Some(earlier), later), Some(earlier));
        assert_eq!(paid_stamp(true, None, later), Some(later));
        assert_eq!(paid_stamp(false, Some(earlier), later), None);
    }

    #[tokio::test]
    async fn test_overdue_then_mark_paid() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;
        let yesterday = today() - Duration::days(1);

        let mut rent = request("Rent", "1500");
        rent.due_date = Some(yesterday);
        let created = ExpenseService::create(&db, owner, rent).await.unwrap();
        assert_eq!(created.status, ExpenseStatus::Overdue);
        assert!(created.paid_at.is_none());

        let paid = ExpenseService::mark_paid(&db, owner, created.id).await.unwrap();
        assert_eq!(paid.status, ExpenseStatus::Paid);
        assert_eq!(paid.paid_at.map(|d| d.date()), Some(today()));

        // deuxième appel: aucun changement
        let again = ExpenseService::mark_paid(&db, owner, created.id).await.unwrap();
        assert_eq!(again.paid_at, paid.paid_at);
    }

    #[tokio::test]
    async fn test_no_due_date_is_pending() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;
        let created = ExpenseService::create(&db, owner, request("Ads", "200")).await.unwrap();
        assert_eq!(created.status, ExpenseStatus::Pending);
    }

    #[tokio::test]
    async fn test_paid_with_future_due_date_is_rejected() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;

        let mut invalid = request("Insurance", "300");
        invalid.paid = Some(true);
        invalid.due_date = Some(today() + Duration::days(10));
        let err = ExpenseService::create(&db, owner, invalid).await.unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.contains_key("due_date")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_clearing_paid_clears_timestamp() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;

        let mut paid = request("Internet", "80");
        paid.paid = Some(true);
        let created = ExpenseService::create(&db, owner, paid).await.unwrap();
        assert!(created.paid_at.is_some());

        let mut unpaid = request("Internet", "80");
        unpaid.paid = Some(false);
        let updated = ExpenseService::update(&db, owner, created.id, unpaid).await.unwrap();
        assert!(!updated.paid);
        assert!(updated.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_foreign_expense_is_not_found() {
        let db = setup_test_db().await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let created = ExpenseService::create(&db, alice, request("Rent", "1500")).await.unwrap();

        assert!(matches!(ExpenseService::get(&db, bob, created.id).await, Err(AppError::NotFound)));
        assert!(matches!(
            ExpenseService::mark_paid(&db, bob, created.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            ExpenseService::delete(&db, bob, created.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_status_filter_and_totals() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;

        let mut overdue = request("Rent", "1000");
        overdue.due_date = Some(today() - Duration::days(3));
        ExpenseService::create(&db, owner, overdue).await.unwrap();

        let mut pending = request("Software", "50");
        pending.due_date = Some(today() + Duration::days(3));
        pending.category = ExpenseCategory::Technology;
        ExpenseService::create(&db, owner, pending).await.unwrap();

        let mut paid = request("Ads", "200");
        paid.paid = Some(true);
        paid.category = ExpenseCategory::Marketing;
        ExpenseService::create(&db, owner, paid).await.unwrap();

        let all = ExpenseService::list(&db, owner, &list_query()).await.unwrap();
        assert_eq!(all.totals.count, 3);
        assert_eq!(all.totals.total.to_string(), "1250.00");
        assert_eq!(all.totals.paid.to_string(), "200.00");
        assert_eq!(all.totals.pending.to_string(), "1050.00");

        for (status, description) in [
            (ExpenseStatus::Overdue, "Rent"),
            (ExpenseStatus::Pending, "Software"),
            (ExpenseStatus::Paid, "Ads"),
        ] {
            let query = ExpenseListQuery {
                status: Some(status),
                ..list_query()
            };
            let page = ExpenseService::list(&db, owner, &query).await.unwrap();
            assert_eq!(page.page.total_items, 1, "status {:?}", status);
            assert_eq!(page.page.items[0].description, description);
        }

        let technology = ExpenseListQuery {
            category: Some(ExpenseCategory::Technology),
            ..list_query()
        };
        let page = ExpenseService::list(&db, owner, &technology).await.unwrap();
        assert_eq!(page.totals.total.to_string(), "50.00");
    }

    #[tokio::test]
    async fn test_list_end_date_and_accented_search() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;
        let mut water = request("Conta de Água", "90");
        water.notes = Some("Ótima tarifa".to_string());
        ExpenseService::create(&db, owner, water).await.unwrap();
        ExpenseService::create(&db, owner, request("Rent", "1000")).await.unwrap();

        let search = ExpenseListQuery {
            search: Some("ÁGUA".to_string()),
            ..list_query()
        };
        let page = ExpenseService::list(&db, owner, &search).await.unwrap();
        assert_eq!(page.totals.count, 1);
        assert_eq!(page.totals.total.to_string(), "90.00");

        let by_note = ExpenseListQuery {
            search: Some("ótima".to_string()),
            ..list_query()
        };
        assert_eq!(ExpenseService::list(&db, owner, &by_note).await.unwrap().totals.count, 1);

        let last_day = ExpenseListQuery {
            end: Some(NaiveDate::MAX),
            ..list_query()
        };
        match ExpenseService::list(&db, owner, &last_day).await {
            Err(AppError::Validation(fields)) => assert!(fields.contains_key("end")),
            other => panic!("expected validation error, got {:?}", other.map(|p| p.totals)),
        }
    }

    #[tokio::test]
    async fn test_oversized_amount_is_rejected() {
        let db = setup_test_db().await;
        let owner = create_user(&db, "alice").await;

        let err = ExpenseService::create(&db, owner, request("Loan", "10000000000"))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.contains_key("amount")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(ExpenseService::create(&db, owner, request("Loan", "9999999999.99")).await.is_ok());
    }
}
