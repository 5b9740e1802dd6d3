pub use sea_orm_migration::prelude::*;

mod m20260110_000000_academic;
mod m20260112_000000_ledger;
mod m20260115_000000_payroll;
mod m20260118_000000_staff;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000000_academic::Migration),
            Box::new(m20260112_000000_ledger::Migration),
            Box::new(m20260115_000000_payroll::Migration),
            Box::new(m20260118_000000_staff::Migration),
        ]
    }
}
