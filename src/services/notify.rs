use crate::{
    error::{AppError, AppResult},
    models::{
        notification, user, BookingStatus, Bus, BusStop, Notification, NotificationKind,
        NotificationView, User,
    },
    services::push,
};
use chrono::NaiveTime;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, Statement, TransactionTrait,
};
use std::sync::OnceLock;

pub const TRAVEL_START_MESSAGE: &str = "Your bus journey is starting. Please confirm if it's you.";
pub const TRAVEL_COMPLETE_MESSAGE: &str = "You have successfully completed your travel.";

/// Shared SELECT joining the stop name and passenger identity onto a
/// notification row. Travel-event rows carry no stop, hence the LEFT JOIN.
const JOINED_SELECT: &str =
    "SELECT n.id, n.kind, n.bus_id, n.bus_stop_id, n.user_id, n.timing, n.status, n.message, \
     n.created_at, bs.stop_name AS bus_stop_name, u.name AS passenger_name, u.expo_token \
     FROM notifications n \
     LEFT JOIN bus_stops bs ON bs.id = n.bus_stop_id \
     JOIN users u ON u.id = n.user_id";

/// Outcome of an advance call. `advanced` is false when the row was already
/// terminal or a concurrent caller won the race; the caller skips push
/// delivery in that case.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub notification: NotificationView,
    pub advanced: bool,
}

pub struct NotificationService {
    db: DatabaseConnection,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a passenger booking in `waiting` state and return the joined
    /// row. The duplicate check and the reference checks run in one
    /// transaction; a concurrent insert that slips past the check still hits
    /// the partial unique index and maps to the same error.
    pub async fn create_booking(
        &self,
        bus_id: i32,
        bus_stop_id: i32,
        user_id: i32,
        timing: &str,
        message: &str,
    ) -> AppResult<NotificationView> {
        let timing = parse_timing(timing)?;
        if message.is_empty() || message.chars().count() > 255 {
            return Err(AppError::Validation(
                "message is required and must not exceed 255 characters".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        Bus::find_by_id(bus_id)
            .one(&txn)
            .await?
            .ok_or(AppError::InvalidReference("bus_id"))?;
        BusStop::find_by_id(bus_stop_id)
            .one(&txn)
            .await?
            .ok_or(AppError::InvalidReference("bus_stop_id"))?;
        User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::InvalidReference("user_id"))?;

        let existing = Notification::find()
            .filter(notification::Column::Kind.eq(NotificationKind::Booking))
            .filter(notification::Column::BusId.eq(bus_id))
            .filter(notification::Column::BusStopId.eq(bus_stop_id))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(
                notification::Column::Status
                    .is_in([BookingStatus::Waiting, BookingStatus::Traveling]),
            )
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicateBooking);
        }

        let now = chrono::Utc::now().naive_utc();
        let inserted = notification::ActiveModel {
            kind: sea_orm::ActiveValue::Set(NotificationKind::Booking),
            bus_id: sea_orm::ActiveValue::Set(bus_id),
            bus_stop_id: sea_orm::ActiveValue::Set(Some(bus_stop_id)),
            user_id: sea_orm::ActiveValue::Set(user_id),
            timing: sea_orm::ActiveValue::Set(Some(timing)),
            message: sea_orm::ActiveValue::Set(message.to_string()),
            status: sea_orm::ActiveValue::Set(BookingStatus::Waiting),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        let inserted = inserted.insert(&txn).await.map_err(map_unique_violation)?;

        txn.commit().await?;

        self.view_by_id(inserted.id).await
    }

    /// Every booking for a bus, newest first, for the conductor dashboard.
    /// The waiting/traveling/completed tabs are client-side filters over this
    /// one list.
    pub async fn bus_notifications(&self, bus_id: i32) -> AppResult<Vec<NotificationView>> {
        let rows = NotificationView::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &format!(
                "{JOINED_SELECT} WHERE n.bus_id = $1 AND n.kind = 'booking' \
                 ORDER BY n.created_at DESC"
            ),
            vec![bus_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Move a booking one step along waiting -> traveling -> completed.
    ///
    /// The transition is persisted with a conditional UPDATE keyed on the
    /// status that was read, so two conductor devices racing on the same row
    /// cannot apply the same step twice or walk it backward; the loser
    /// matches zero rows and gets the fresh state back with `advanced`
    /// false. Advancing a completed row is a no-op, not an error.
    pub async fn advance_status(
        &self,
        notification_id: i32,
        bus_id: i32,
    ) -> AppResult<StatusChange> {
        let existing = Notification::find()
            .filter(notification::Column::Id.eq(notification_id))
            .filter(notification::Column::BusId.eq(bus_id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound(
                "Notification not found or not authorized for this bus",
            ))?;

        if existing.status.is_terminal() {
            let notification = self.view_by_id(notification_id).await?;
            return Ok(StatusChange {
                notification,
                advanced: false,
            });
        }

        let next = existing.status.next();
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE notifications SET status = $1 \
                 WHERE id = $2 AND bus_id = $3 AND status = $4",
                vec![
                    next.as_str().into(),
                    notification_id.into(),
                    bus_id.into(),
                    existing.status.as_str().into(),
                ],
            ))
            .await?;

        let notification = self.view_by_id(notification_id).await?;
        Ok(StatusChange {
            notification,
            advanced: result.rows_affected() > 0,
        })
    }

    /// Record that the conductor started the passenger's journey; the
    /// confirmation push is sent by the caller from the returned view.
    pub async fn record_travel_start(
        &self,
        bus_id: i32,
        user_id: i32,
    ) -> AppResult<NotificationView> {
        self.record_travel_event(
            bus_id,
            user_id,
            NotificationKind::StartTravel,
            BookingStatus::Waiting,
            TRAVEL_START_MESSAGE,
        )
        .await
    }

    /// Record the end of the passenger's journey; inserted already terminal.
    pub async fn record_travel_completion(
        &self,
        bus_id: i32,
        user_id: i32,
    ) -> AppResult<NotificationView> {
        self.record_travel_event(
            bus_id,
            user_id,
            NotificationKind::CompleteTravel,
            BookingStatus::Completed,
            TRAVEL_COMPLETE_MESSAGE,
        )
        .await
    }

    async fn record_travel_event(
        &self,
        bus_id: i32,
        user_id: i32,
        kind: NotificationKind,
        status: BookingStatus,
        message: &str,
    ) -> AppResult<NotificationView> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("Passenger not found"))?;

        let inserted = notification::ActiveModel {
            kind: sea_orm::ActiveValue::Set(kind),
            bus_id: sea_orm::ActiveValue::Set(bus_id),
            bus_stop_id: sea_orm::ActiveValue::Set(None),
            user_id: sea_orm::ActiveValue::Set(user_id),
            timing: sea_orm::ActiveValue::Set(None),
            message: sea_orm::ActiveValue::Set(message.to_string()),
            status: sea_orm::ActiveValue::Set(status),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        let inserted = inserted.insert(&self.db).await?;

        self.view_by_id(inserted.id).await
    }

    /// Resolve the passenger's pending start-travel rows. Zero rows affected
    /// is not an error; confirming twice is harmless.
    pub async fn confirm_travel(&self, bus_id: i32, user_id: i32) -> AppResult<u64> {
        use sea_orm::sea_query::Expr;

        let result = Notification::update_many()
            .col_expr(
                notification::Column::Status,
                Expr::value(BookingStatus::Completed),
            )
            .filter(notification::Column::Kind.eq(NotificationKind::StartTravel))
            .filter(notification::Column::BusId.eq(bus_id))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Status.eq(BookingStatus::Waiting))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Store the passenger device's push address after checking it against
    /// the gateway's token scheme.
    pub async fn save_push_token(&self, user_id: i32, token: &str) -> AppResult<()> {
        if !push::is_valid_expo_token(token) {
            return Err(AppError::Validation(
                "expo_push_token must be a valid Expo push token".to_string(),
            ));
        }

        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::InvalidReference("user_id"))?;

        let mut active: user::ActiveModel = existing.into();
        active.expo_token = sea_orm::ActiveValue::Set(Some(token.to_string()));
        active.update(&self.db).await?;
        Ok(())
    }

    /// Push address for a passenger, or 404 if the passenger is unknown.
    pub async fn passenger_token(&self, user_id: i32) -> AppResult<Option<String>> {
        let user = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("Passenger not found"))?;
        Ok(user.expo_token)
    }

    async fn view_by_id(&self, id: i32) -> AppResult<NotificationView> {
        NotificationView::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &format!("{JOINED_SELECT} WHERE n.id = $1"),
            vec![id.into()],
        ))
        .one(&self.db)
        .await?
        .ok_or(AppError::NotFound("Notification not found"))
    }
}

fn map_unique_violation(err: sea_orm::DbErr) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateBooking,
        _ => AppError::Database(err),
    }
}

/// Expected arrival must be a real time of day in `HH:mm:ss` shape; the
/// two-digit form is required, so "9:5:0" is rejected.
fn parse_timing(raw: &str) -> Result<NaiveTime, AppError> {
    fn timing_format() -> &'static Regex {
        static TIMING_FORMAT: OnceLock<Regex> = OnceLock::new();
        TIMING_FORMAT.get_or_init(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("literal regex"))
    }

    if !timing_format().is_match(raw) {
        return Err(AppError::Validation(
            "timing must be in HH:mm:ss format".to_string(),
        ));
    }

    NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|_| {
        AppError::Validation("timing must be in HH:mm:ss format".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::parse_timing;

    #[test]
    fn accepts_two_digit_times() {
        assert!(parse_timing("09:05:00").is_ok());
        assert!(parse_timing("14:30:00").is_ok());
        assert!(parse_timing("00:00:00").is_ok());
        assert!(parse_timing("23:59:59").is_ok());
    }

    #[test]
    fn rejects_unpadded_times() {
        assert!(parse_timing("9:5:0").is_err());
        assert!(parse_timing("14:30").is_err());
    }

    #[test]
    fn rejects_out_of_range_times() {
        assert!(parse_timing("25:00:00").is_err());
        assert!(parse_timing("12:60:00").is_err());
        assert!(parse_timing("12:00:61").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timing("").is_err());
        assert!(parse_timing("not-a-time").is_err());
        assert!(parse_timing("14:30:00extra").is_err());
    }
}
