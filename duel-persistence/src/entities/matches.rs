use sea_orm::entity::prelude::*;

/// A paired 1v1 game. Created at pairing time and mutated exactly once, when
/// the game ends by win or abandonment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub player_one: Uuid,
    pub player_two: Uuid,
    pub target_word: String,
    pub status: String,
    pub winner: Option<Uuid>,
    pub abandoned_by: Option<Uuid>,
    pub started_at: DateTimeWithTimeZone,
    pub ended_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
