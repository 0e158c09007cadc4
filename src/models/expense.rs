// ============================================================================
// MODÈLE : EXPENSES
// ============================================================================
//
// Description:
//   Dépenses de l'entreprise (loyer, impôts, salaires...).
//
// Statut (jamais stocké, dérivé à la lecture):
//   - paid = true                        → Paid
//   - paid = false et due_date < today   → Overdue
//   - sinon (y compris sans échéance)    → Pending
//
// Points d'attention:
//   - paid et paid_at vont toujours ensemble (voir ExpenseService)
//   - La transition vers Paid est irréversible via mark-paid
//
// ============================================================================

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    #[sea_orm(string_value = "operational")]
    Operational,
    #[sea_orm(string_value = "marketing")]
    Marketing,
    #[sea_orm(string_value = "administrative")]
    Administrative,
    #[sea_orm(string_value = "technology")]
    Technology,
    #[sea_orm(string_value = "human_resources")]
    HumanResources,
    #[sea_orm(string_value = "financial")]
    Financial,
    #[sea_orm(string_value = "legal")]
    Legal,
    #[sea_orm(string_value = "infrastructure")]
    Infrastructure,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Operational => "Operational",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Administrative => "Administrative",
            ExpenseCategory::Technology => "Technology",
            ExpenseCategory::HumanResources => "Human Resources",
            ExpenseCategory::Financial => "Financial",
            ExpenseCategory::Legal => "Legal",
            ExpenseCategory::Infrastructure => "Infrastructure",
            ExpenseCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Paid,
    Pending,
    Overdue,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub description: String,
    pub category: ExpenseCategory,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub incurred_at: DateTime,
    pub due_date: Option<Date>,
    pub paid: bool,
    pub paid_at: Option<DateTime>,
    pub recurring: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    /// Statut de paiement vu depuis `today`
    pub fn status_on(&self, today: NaiveDate) -> ExpenseStatus {
        if self.paid || self.paid_at.is_some() {
            return ExpenseStatus::Paid;
        }
        match self.due_date {
            Some(due) if due < today => ExpenseStatus::Overdue,
            _ => ExpenseStatus::Pending,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn expense(due_date: Option<NaiveDate>, paid: bool) -> Model {
        let stamp = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Model {
            id: 1,
            user_id: 1,
            description: "Rent".to_string(),
            category: ExpenseCategory::Operational,
            amount: Decimal::new(150000, 2),
            incurred_at: stamp,
            due_date,
            paid,
            paid_at: if paid { Some(stamp) } else { None },
            recurring: true,
            notes: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[test]
    fn test_status_overdue_when_due_date_passed() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        assert_eq!(expense(Some(yesterday), false).status_on(today), ExpenseStatus::Overdue);
    }

    #[test]
    fn test_status_pending_on_or_before_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(expense(Some(today), false).status_on(today), ExpenseStatus::Pending);
        assert_eq!(
            expense(today.succ_opt(), false).status_on(today),
            ExpenseStatus::Pending
        );
        assert_eq!(expense(None, false).status_on(today), ExpenseStatus::Pending);
    }

    #[test]
    fn test_status_paid_ignores_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let long_ago = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(expense(Some(long_ago), true).status_on(today), ExpenseStatus::Paid);
    }

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&ExpenseCategory::HumanResources).unwrap();
        assert_eq!(json, "\"human_resources\"");
        assert_eq!(ExpenseCategory::HumanResources.label(), "Human Resources");
    }
}
