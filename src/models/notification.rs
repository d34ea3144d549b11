use sea_orm::entity::prelude::*;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a notification. Ordered: a row only ever moves toward
/// `Completed` and never back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "traveling")]
    Traveling,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BookingStatus {
    /// Forward-only transition table used by the conductor advance operation.
    /// `Completed` is terminal and maps to itself.
    pub fn next(self) -> BookingStatus {
        match self {
            BookingStatus::Waiting => BookingStatus::Traveling,
            BookingStatus::Traveling => BookingStatus::Completed,
            BookingStatus::Completed => BookingStatus::Completed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed)
    }

    /// Active rows are the ones the duplicate-booking invariant counts.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Waiting | BookingStatus::Traveling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Waiting => "waiting",
            BookingStatus::Traveling => "traveling",
            BookingStatus::Completed => "completed",
        }
    }
}

/// One table carries both passenger bookings and the travel-event records the
/// conductor flow produces; `kind` tells them apart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[sea_orm(string_value = "booking")]
    Booking,
    #[sea_orm(string_value = "start_travel")]
    StartTravel,
    #[sea_orm(string_value = "complete_travel")]
    CompleteTravel,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: NotificationKind,
    pub bus_id: i32,
    /// Set for bookings; travel-event rows are not tied to a stop.
    pub bus_stop_id: Option<i32>,
    pub user_id: i32,
    /// Expected arrival at the stop; set for bookings only.
    pub timing: Option<Time>,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub message: String,
    pub status: BookingStatus,
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
    #[sea_orm(
        belongs_to = "super::bus_stop::Entity",
        from = "Column::BusStopId",
        to = "super::bus_stop::Column::Id"
    )]
    BusStop,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
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

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A notification joined with its stop and passenger, the shape every API
/// response, broadcast payload and conductor roster works with.
///
/// `expo_token` rides along for push delivery after a status change and is
/// never serialized to clients.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize, ToSchema)]
pub struct NotificationView {
    pub id: i32,
    pub kind: NotificationKind,
    pub bus_id: i32,
    pub bus_stop_id: Option<i32>,
    pub user_id: i32,
    pub timing: Option<chrono::NaiveTime>,
    pub status: BookingStatus,
    pub message: String,
    pub created_at: DateTime,
    pub bus_stop_name: Option<String>,
    pub passenger_name: String,
    #[serde(skip_serializing, default)]
    pub expo_token: Option<String>,
}
