//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::DistrictId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Report::Description).text().not_null())
                    .col(ColumnDef::new(Report::ImageBase64).text())
                    .col(ColumnDef::new(Report::Latitude).double().not_null())
                    .col(ColumnDef::new(Report::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Report::ReceptionStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Report::TraitementStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_user")
                            .from(Report::Table, Report::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_district")
                            .from(Report::Table, Report::DistrictId)
                            .to(District::Table, District::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: district_id (agent listings are district-scoped)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_district_id")
                    .table(Report::Table)
                    .col(Report::DistrictId)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (per-user listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_user_id")
                    .table(Report::Table)
                    .col(Report::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    UserId,
    DistrictId,
    Title,
    Description,
    ImageBase64,
    Latitude,
    Longitude,
    ReceptionStatus,
    TraitementStatus,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum District {
    Table,
    Id,
}
