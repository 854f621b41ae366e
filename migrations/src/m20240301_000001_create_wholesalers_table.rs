use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wholesalers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wholesalers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wholesalers::BusinessName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Wholesalers::ContactEmail).string().null())
                    .col(
                        ColumnDef::new(Wholesalers::DefaultLowStockThreshold)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Wholesalers::PlatformFeePercent)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Wholesalers::PlatformFeeFixed)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Wholesalers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wholesalers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Wholesalers {
    Table,
    Id,
    BusinessName,
    ContactEmail,
    DefaultLowStockThreshold,
    PlatformFeePercent,
    PlatformFeeFixed,
    CreatedAt,
}
