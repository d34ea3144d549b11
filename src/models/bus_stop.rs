use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bus_stops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stop_name: String,
    #[sea_orm(column_type = "Double")]
    pub latitude: f64,
    #[sea_orm(column_type = "Double")]
    pub longitude: f64,
    pub city: Option<String>,
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

/// A stop with its haversine distance in kilometers from the query point.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct NearbyStop {
    pub id: i32,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
}
