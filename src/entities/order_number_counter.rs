use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-wholesaler order-number sequence row. Bumped with an atomic
/// `last_value = last_value + 1` on the order-creation transaction; the
/// UNIQUE constraint on orders.order_number is the backstop.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_number_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub wholesaler_id: Uuid,
    pub prefix: String,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wholesaler::Entity",
        from = "Column::WholesalerId",
        to = "super::wholesaler::Column::Id"
    )]
    Wholesaler,
}

impl Related<super::wholesaler::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wholesaler.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
