use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_wholesalers_table::Wholesalers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One sequence row per wholesaler, bumped atomically inside the
        // order-creation transaction
        manager
            .create_table(
                Table::create()
                    .table(OrderNumberCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderNumberCounters::WholesalerId)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderNumberCounters::Prefix)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderNumberCounters::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_number_counters_wholesaler_id")
                            .from(
                                OrderNumberCounters::Table,
                                OrderNumberCounters::WholesalerId,
                            )
                            .to(Wholesalers::Table, Wholesalers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderNumberCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderNumberCounters {
    Table,
    WholesalerId,
    Prefix,
    LastValue,
}
