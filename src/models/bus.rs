use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub trip_code: String,
    /// Hardware identifier of the conductor device assigned to this bus.
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub device_id: String,
    pub wheelchair_accessible: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bus_timing::Entity")]
    BusTimings,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::bus_timing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusTimings.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
