//! Student wallet schema: accounts and their append-only log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Students {
    Table,
    Id,
}

#[derive(Iden)]
enum StudentAccounts {
    Table,
    Id,
    StudentId,
    Code,
    BalanceMinor,
    Active,
}

#[derive(Iden)]
enum AccountLogs {
    Table,
    Id,
    AccountId,
    AmountMinor,
    Kind,
    Note,
    PerformerId,
    PerformerName,
    GroupId,
    PeriodKey,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StudentAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentAccounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentAccounts::StudentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentAccounts::Code).string().not_null())
                    .col(
                        ColumnDef::new(StudentAccounts::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentAccounts::Active).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_accounts-student_id")
                            .from(StudentAccounts::Table, StudentAccounts::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-student_accounts-code")
                    .table(StudentAccounts::Table)
                    .col(StudentAccounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountLogs::AccountId).string().not_null())
                    .col(
                        ColumnDef::new(AccountLogs::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountLogs::Kind).string().not_null())
                    .col(ColumnDef::new(AccountLogs::Note).string())
                    .col(ColumnDef::new(AccountLogs::PerformerId).string().not_null())
                    .col(
                        ColumnDef::new(AccountLogs::PerformerName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountLogs::GroupId).string())
                    .col(ColumnDef::new(AccountLogs::PeriodKey).string())
                    .col(ColumnDef::new(AccountLogs::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_logs-account_id")
                            .from(AccountLogs::Table, AccountLogs::AccountId)
                            .to(StudentAccounts::Table, StudentAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_logs-account_id-created_at")
                    .table(AccountLogs::Table)
                    .col(AccountLogs::AccountId)
                    .col(AccountLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // The monthly charge idempotency key.
        manager
            .create_index(
                Index::create()
                    .name("uidx-account_logs-account_id-period_key")
                    .table(AccountLogs::Table)
                    .col(AccountLogs::AccountId)
                    .col(AccountLogs::PeriodKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
