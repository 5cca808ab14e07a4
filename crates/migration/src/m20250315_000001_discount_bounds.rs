//! Numeric discount bounds on `locations`.
//!
//! Databases created before the bounds existed only carry the free-text
//! `discount_value`. Each column is added only when missing, so the step is
//! safe to run against a schema that already has them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Locations {
    Table,
    DiscountMin,
    DiscountMax,
}

async fn add_bound_if_missing(manager: &SchemaManager<'_>, column: Locations) -> Result<(), DbErr> {
    let name = column.to_string();
    if manager.has_column("locations", &name).await? {
        return Ok(());
    }

    manager
        .alter_table(
            Table::alter()
                .table(Locations::Table)
                .add_column(ColumnDef::new(column).double().null())
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        add_bound_if_missing(manager, Locations::DiscountMin).await?;
        add_bound_if_missing(manager, Locations::DiscountMax).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Locations::Table)
                    .drop_column(Locations::DiscountMax)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Locations::Table)
                    .drop_column(Locations::DiscountMin)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
