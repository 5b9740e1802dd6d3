//! Academic calendar schema: groups, roster, lessons, exams, journals.
//!
//! The unique indexes here are the natural keys the schedulers rely on:
//! one journal per (group, week number), one entry per (journal, student,
//! day, lesson number), one exam per (group, week). Lessons are soft-marked
//! instead of deleted, so their (group, week, day) key is enforced by the
//! engine's check-then-insert, not by the schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    MentorId,
    StartDate,
    EndDate,
    TotalWeeks,
    LessonsPerDay,
    LessonStart,
    LessonEnd,
    Classroom,
    MonthlyFeeMinor,
    CurrentWeek,
    Started,
    Archived,
}

#[derive(Iden)]
enum Students {
    Table,
    Id,
    Name,
    Phone,
    Active,
}

#[derive(Iden)]
enum Enrollments {
    Table,
    Id,
    StudentId,
    GroupId,
    DiscountMinor,
    PaymentStatus,
    Active,
    JoinedOn,
}

#[derive(Iden)]
enum Lessons {
    Table,
    Id,
    GroupId,
    Week,
    Day,
    Date,
    StartsAt,
    EndsAt,
    Deleted,
}

#[derive(Iden)]
enum Exams {
    Table,
    Id,
    GroupId,
    Week,
    Date,
}

#[derive(Iden)]
enum Journals {
    Table,
    Id,
    GroupId,
    WeekNumber,
    WeekStart,
    WeekEnd,
}

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    JournalId,
    StudentId,
    Day,
    LessonNumber,
    Grade,
    Bonus,
    Attendance,
    Comment,
    CommentAuthorId,
    CommentAuthorName,
    Kind,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(ColumnDef::new(Groups::MentorId).string().not_null())
                    .col(ColumnDef::new(Groups::StartDate).date().not_null())
                    .col(ColumnDef::new(Groups::EndDate).date().not_null())
                    .col(ColumnDef::new(Groups::TotalWeeks).integer().not_null())
                    .col(ColumnDef::new(Groups::LessonsPerDay).integer().not_null())
                    .col(ColumnDef::new(Groups::LessonStart).time().not_null())
                    .col(ColumnDef::new(Groups::LessonEnd).time().not_null())
                    .col(ColumnDef::new(Groups::Classroom).string())
                    .col(
                        ColumnDef::new(Groups::MonthlyFeeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Groups::CurrentWeek)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Groups::Started).boolean().not_null())
                    .col(ColumnDef::new(Groups::Archived).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string().not_null())
                    .col(ColumnDef::new(Students::Phone).string())
                    .col(ColumnDef::new(Students::Active).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollments::StudentId).string().not_null())
                    .col(ColumnDef::new(Enrollments::GroupId).string().not_null())
                    .col(
                        ColumnDef::new(Enrollments::DiscountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::PaymentStatus)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::Active).boolean().not_null())
                    .col(ColumnDef::new(Enrollments::JoinedOn).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-enrollments-student_id")
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-enrollments-group_id")
                            .from(Enrollments::Table, Enrollments::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-enrollments-group_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lessons::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lessons::GroupId).string().not_null())
                    .col(ColumnDef::new(Lessons::Week).integer().not_null())
                    .col(ColumnDef::new(Lessons::Day).integer().not_null())
                    .col(ColumnDef::new(Lessons::Date).date().not_null())
                    .col(ColumnDef::new(Lessons::StartsAt).time().not_null())
                    .col(ColumnDef::new(Lessons::EndsAt).time().not_null())
                    .col(ColumnDef::new(Lessons::Deleted).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lessons-group_id")
                            .from(Lessons::Table, Lessons::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-lessons-group_id-week-day")
                    .table(Lessons::Table)
                    .col(Lessons::GroupId)
                    .col(Lessons::Week)
                    .col(Lessons::Day)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Exams::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Exams::GroupId).string().not_null())
                    .col(ColumnDef::new(Exams::Week).integer().not_null())
                    .col(ColumnDef::new(Exams::Date).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-exams-group_id")
                            .from(Exams::Table, Exams::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-exams-group_id-week")
                    .table(Exams::Table)
                    .col(Exams::GroupId)
                    .col(Exams::Week)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Journals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Journals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Journals::GroupId).string().not_null())
                    .col(ColumnDef::new(Journals::WeekNumber).integer().not_null())
                    .col(ColumnDef::new(Journals::WeekStart).date().not_null())
                    .col(ColumnDef::new(Journals::WeekEnd).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journals-group_id")
                            .from(Journals::Table, Journals::GroupId)
                            .to(Groups::Table, Groups::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-journals-group_id-week_number")
                    .table(Journals::Table)
                    .col(Journals::GroupId)
                    .col(Journals::WeekNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::JournalId).string().not_null())
                    .col(ColumnDef::new(JournalEntries::StudentId).string().not_null())
                    .col(ColumnDef::new(JournalEntries::Day).integer().not_null())
                    .col(
                        ColumnDef::new(JournalEntries::LessonNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::Grade).double())
                    .col(ColumnDef::new(JournalEntries::Bonus).double())
                    .col(
                        ColumnDef::new(JournalEntries::Attendance)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::Comment).string())
                    .col(ColumnDef::new(JournalEntries::CommentAuthorId).string())
                    .col(ColumnDef::new(JournalEntries::CommentAuthorName).string())
                    .col(ColumnDef::new(JournalEntries::Kind).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-journal_id")
                            .from(JournalEntries::Table, JournalEntries::JournalId)
                            .to(Journals::Table, Journals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-student_id")
                            .from(JournalEntries::Table, JournalEntries::StudentId)
                            .to(Students::Table, Students::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-journal_entries-natural_key")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::JournalId)
                    .col(JournalEntries::StudentId)
                    .col(JournalEntries::Day)
                    .col(JournalEntries::LessonNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Journals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        Ok(())
    }
}
