//! Payroll schema: contracts, work logs, advances, monthly records.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PayrollContracts {
    Table,
    Id,
    PersonId,
    PersonKind,
    CenterId,
    FixedMinor,
    HourlyRateMinor,
    PercentageBp,
    EffectiveFrom,
    EffectiveTo,
    Active,
}

#[derive(Iden)]
enum WorkLogs {
    Table,
    Id,
    PersonId,
    PersonKind,
    Date,
    Minutes,
    GroupId,
    Month,
    Year,
}

#[derive(Iden)]
enum Advances {
    Table,
    Id,
    PersonId,
    PersonKind,
    CenterId,
    AmountMinor,
    Month,
    Year,
    Status,
    SettledBy,
    GrantedAt,
}

#[derive(Iden)]
enum PayrollRecords {
    Table,
    Id,
    PersonId,
    PersonKind,
    CenterId,
    Month,
    Year,
    Minutes,
    FixedMinor,
    HourlyMinor,
    PercentageMinor,
    BonusMinor,
    FineMinor,
    AdvanceMinor,
    GrossMinor,
    NetMinor,
    Status,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PayrollContracts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayrollContracts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PayrollContracts::PersonId).string().not_null())
                    .col(
                        ColumnDef::new(PayrollContracts::PersonKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PayrollContracts::CenterId).string().not_null())
                    .col(
                        ColumnDef::new(PayrollContracts::FixedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollContracts::HourlyRateMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollContracts::PercentageBp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollContracts::EffectiveFrom)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PayrollContracts::EffectiveTo).date())
                    .col(ColumnDef::new(PayrollContracts::Active).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payroll_contracts-person")
                    .table(PayrollContracts::Table)
                    .col(PayrollContracts::PersonId)
                    .col(PayrollContracts::PersonKind)
                    .col(PayrollContracts::CenterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WorkLogs::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(WorkLogs::PersonId).string().not_null())
                    .col(ColumnDef::new(WorkLogs::PersonKind).string().not_null())
                    .col(ColumnDef::new(WorkLogs::Date).date().not_null())
                    .col(ColumnDef::new(WorkLogs::Minutes).integer().not_null())
                    .col(ColumnDef::new(WorkLogs::GroupId).string())
                    .col(ColumnDef::new(WorkLogs::Month).integer().not_null())
                    .col(ColumnDef::new(WorkLogs::Year).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-work_logs-person-month-year")
                    .table(WorkLogs::Table)
                    .col(WorkLogs::PersonId)
                    .col(WorkLogs::PersonKind)
                    .col(WorkLogs::Month)
                    .col(WorkLogs::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Advances::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Advances::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Advances::PersonId).string().not_null())
                    .col(ColumnDef::new(Advances::PersonKind).string().not_null())
                    .col(ColumnDef::new(Advances::CenterId).string().not_null())
                    .col(
                        ColumnDef::new(Advances::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Advances::Month).integer().not_null())
                    .col(ColumnDef::new(Advances::Year).integer().not_null())
                    .col(ColumnDef::new(Advances::Status).string().not_null())
                    .col(ColumnDef::new(Advances::SettledBy).string())
                    .col(ColumnDef::new(Advances::GrantedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-advances-person-month-year")
                    .table(Advances::Table)
                    .col(Advances::PersonId)
                    .col(Advances::PersonKind)
                    .col(Advances::Month)
                    .col(Advances::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PayrollRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayrollRecords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PayrollRecords::PersonId).string().not_null())
                    .col(
                        ColumnDef::new(PayrollRecords::PersonKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PayrollRecords::CenterId).string().not_null())
                    .col(ColumnDef::new(PayrollRecords::Month).integer().not_null())
                    .col(ColumnDef::new(PayrollRecords::Year).integer().not_null())
                    .col(ColumnDef::new(PayrollRecords::Minutes).integer().not_null())
                    .col(
                        ColumnDef::new(PayrollRecords::FixedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::HourlyMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::PercentageMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::BonusMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::FineMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::AdvanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::GrossMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRecords::NetMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PayrollRecords::Status).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-payroll_records-person-center-month-year")
                    .table(PayrollRecords::Table)
                    .col(PayrollRecords::PersonId)
                    .col(PayrollRecords::PersonKind)
                    .col(PayrollRecords::CenterId)
                    .col(PayrollRecords::Month)
                    .col(PayrollRecords::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PayrollRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Advances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PayrollContracts::Table).to_owned())
            .await?;
        Ok(())
    }
}
