use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::StockLevels;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    /// Warehouse code; unique together with `book_id`
    pub warehouse: String,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub reorder_level: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Model {
    pub fn levels(&self) -> StockLevels {
        StockLevels::new(self.quantity, self.reserved_quantity)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Book,
    #[sea_orm(has_many = "super::inventory_transaction::Entity")]
    Transactions,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::inventory_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
