use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

use crate::services::pricing;

// Produit ou service vendu.
// Le prix final et le profit ne sont PAS stockés: ils sont recalculés
// à chaque lecture depuis base_cost et margin_percent (voir services::pricing).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub base_cost: Decimal, // >= 0
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub margin_percent: Decimal, // entre 0 et 999.99
    pub active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn final_price(&self) -> Decimal {
        pricing::final_price(self.base_cost, self.margin_percent)
    }

    pub fn profit(&self) -> Decimal {
        pricing::profit(self.base_cost, self.margin_percent)
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

    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,

    #[sea_orm(has_many = "super::sale::Entity")]
    Sale,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
