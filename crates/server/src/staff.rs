//! Staff table (minimal entity).
//!
//! The Basic-auth identity; its display name becomes the performer recorded
//! on ledger and journal writes. Rows are seeded by the admin CLI.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The audit identity recorded on writes performed by this staff member.
    pub fn performer(&self) -> engine::Performer {
        engine::Performer {
            id: self.username.clone(),
            name: self.display_name.clone(),
        }
    }
}
