use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of ledger entries. Stored as strings in the DB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Initial,
    Purchase,
    ManualIncrease,
    ManualDecrease,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Initial => "initial",
            MovementType::Purchase => "purchase",
            MovementType::ManualIncrease => "manual_increase",
            MovementType::ManualDecrease => "manual_decrease",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(MovementType::Initial),
            "purchase" => Some(MovementType::Purchase),
            "manual_increase" => Some(MovementType::ManualIncrease),
            "manual_decrease" => Some(MovementType::ManualDecrease),
            _ => None,
        }
    }
}

/// One row of the append-only stock ledger. Rows are inserted inside the
/// transaction that mutates the product and are never updated or deleted;
/// `stock_after = stock_before + quantity` holds for every row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub wholesaler_id: Uuid,
    pub movement_type: String,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    pub order_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
