use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Scheduled arrival of a bus at a stop, one row per (bus, stop, time).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bus_timings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bus_id: i32,
    pub stop_id: i32,
    pub arrival_time: Time,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bus::Entity",
        from = "Column::BusId",
        to = "super::bus::Column::Id"
    )]
    Bus,
    #[sea_orm(
        belongs_to = "super::bus_stop::Entity",
        from = "Column::StopId",
        to = "super::bus_stop::Column::Id"
    )]
    BusStop,
}

impl Related<super::bus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bus.def()
    }
}

impl Related<super::bus_stop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusStop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A timetable row joined with the bus serving it, the shape the passenger
/// timetable endpoint returns.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct BusTimingRow {
    pub timing_id: i32,
    pub bus_id: i32,
    pub bus_name: String,
    pub trip_code: String,
    pub arrival_time: chrono::NaiveTime,
    pub wheelchair_accessible: bool,
}
