use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account rows are owned by the (external) auth service; this crate reads
/// them for validation and display joins and writes only `expo_token`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// "passenger" or "conductor".
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub role: String,
    /// Conductors are tied to the bus their device runs.
    pub bus_id: Option<i32>,
    #[serde(skip_serializing)]
    pub expo_token: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bus::Entity",
        from = "Column::BusId",
        to = "super::bus::Column::Id"
    )]
    Bus,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
