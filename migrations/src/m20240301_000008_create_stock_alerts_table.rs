use sea_orm_migration::prelude::*;

use super::m20240301_000004_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockAlerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockAlerts::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockAlerts::ProductId).uuid().not_null())
                    .col(ColumnDef::new(StockAlerts::WholesalerId).uuid().not_null())
                    .col(ColumnDef::new(StockAlerts::AlertType).string().not_null())
                    .col(
                        ColumnDef::new(StockAlerts::CurrentStock)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAlerts::Threshold)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockAlerts::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StockAlerts::IsResolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(StockAlerts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(StockAlerts::ResolvedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_alerts_product_id")
                            .from(StockAlerts::Table, StockAlerts::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_alerts_product_id")
                    .table(StockAlerts::Table)
                    .col(StockAlerts::ProductId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockAlerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum StockAlerts {
    Table,
    Id,
    ProductId,
    WholesalerId,
    AlertType,
    CurrentStock,
    Threshold,
    IsRead,
    IsResolved,
    CreatedAt,
    ResolvedAt,
}
