use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_wholesalers_table::Wholesalers;
use super::m20240301_000002_create_customers_table::Customers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Explicit wholesaler-customer relationship records
        manager
            .create_table(
                Table::create()
                    .table(WholesalerCustomers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WholesalerCustomers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WholesalerCustomers::WholesalerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WholesalerCustomers::CustomerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WholesalerCustomers::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(WholesalerCustomers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wholesaler_customers_wholesaler_id")
                            .from(WholesalerCustomers::Table, WholesalerCustomers::WholesalerId)
                            .to(Wholesalers::Table, Wholesalers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wholesaler_customers_customer_id")
                            .from(WholesalerCustomers::Table, WholesalerCustomers::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wholesaler_customers_pair")
                    .table(WholesalerCustomers::Table)
                    .col(WholesalerCustomers::WholesalerId)
                    .col(WholesalerCustomers::CustomerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Customer groups (the current membership mechanism)
        manager
            .create_table(
                Table::create()
                    .table(CustomerGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerGroups::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerGroups::WholesalerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerGroups::Name).string().not_null())
                    .col(
                        ColumnDef::new(CustomerGroups::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_groups_wholesaler_id")
                            .from(CustomerGroups::Table, CustomerGroups::WholesalerId)
                            .to(Wholesalers::Table, Wholesalers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerGroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerGroupMembers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerGroupMembers::GroupId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerGroupMembers::CustomerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerGroupMembers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_group_members_group_id")
                            .from(CustomerGroupMembers::Table, CustomerGroupMembers::GroupId)
                            .to(CustomerGroups::Table, CustomerGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_group_members_customer_id")
                            .from(CustomerGroupMembers::Table, CustomerGroupMembers::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customer_group_members_pair")
                    .table(CustomerGroupMembers::Table)
                    .col(CustomerGroupMembers::GroupId)
                    .col(CustomerGroupMembers::CustomerId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerGroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WholesalerCustomers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WholesalerCustomers {
    Table,
    Id,
    WholesalerId,
    CustomerId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CustomerGroups {
    Table,
    Id,
    WholesalerId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CustomerGroupMembers {
    Table,
    Id,
    GroupId,
    CustomerId,
    CreatedAt,
}
