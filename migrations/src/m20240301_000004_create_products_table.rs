use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_wholesalers_table::Wholesalers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Products::WholesalerId).uuid().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::UnitPrice).decimal().not_null())
                    .col(ColumnDef::new(Products::PalletPrice).decimal().null())
                    // Canonical stock count in base units; signed so oversell stays visible
                    .col(
                        ColumnDef::new(Products::BaseUnitStock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::QuantityInPack)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Products::UnitsPerPallet)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Products::LowStockThreshold)
                            .big_integer()
                            .null(),
                    )
                    // Legacy display mirrors, derived from base_unit_stock
                    .col(
                        ColumnDef::new(Products::Stock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::PalletStock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_wholesaler_id")
                            .from(Products::Table, Products::WholesalerId)
                            .to(Wholesalers::Table, Wholesalers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_wholesaler_id")
                    .table(Products::Table)
                    .col(Products::WholesalerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    WholesalerId,
    Name,
    UnitPrice,
    PalletPrice,
    BaseUnitStock,
    QuantityInPack,
    UnitsPerPallet,
    LowStockThreshold,
    Stock,
    PalletStock,
    CreatedAt,
    UpdatedAt,
}
