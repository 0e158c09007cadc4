use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

use crate::services::pricing;

// Vente d'un produit.
//
// unit_cost / unit_price = photo du produit au moment où la vente est
// enregistrée (ou modifiée). Les totaux sont dérivés à la lecture:
//   revenue = unit_price × quantity
//   cost    = unit_cost  × quantity
//   profit  = revenue - cost
//   margin  = profit / cost × 100  (0 si cost = 0)
// Les montants sont bornés à l'écriture. Ici les produits saturent au lieu de paniquer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,
    pub sale_date: DateTime,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn revenue(&self) -> Decimal {
        self.unit_price.saturating_mul(self.quantity)
    }

    pub fn cost(&self) -> Decimal {
        self.unit_cost.saturating_mul(self.quantity)
    }

    pub fn profit(&self) -> Decimal {
        self.revenue().saturating_sub(self.cost())
    }

    pub fn realized_margin(&self) -> Decimal {
        pricing::realized_margin(self.profit(), self.cost())
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
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Restrict"
    )]
    Product,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
