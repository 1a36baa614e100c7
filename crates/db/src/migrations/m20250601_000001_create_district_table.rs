//! Create district table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(District::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(District::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(District::Name).string_len(256).not_null())
                    .col(ColumnDef::new(District::Country).string_len(128).not_null())
                    .col(ColumnDef::new(District::Region).string_len(128).not_null())
                    .col(ColumnDef::new(District::Status).string_len(16).not_null())
                    .col(ColumnDef::new(District::Geo).text().not_null())
                    .col(ColumnDef::new(District::Area).double().not_null())
                    .col(ColumnDef::new(District::Centroid).json_binary().not_null())
                    .col(
                        ColumnDef::new(District::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (listAll orders by creation time)
        manager
            .create_index(
                Index::create()
                    .name("idx_district_created_at")
                    .table(District::Table)
                    .col(District::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(District::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum District {
    Table,
    Id,
    Name,
    Country,
    Region,
    Status,
    Geo,
    Area,
    Centroid,
    CreatedAt,
}
