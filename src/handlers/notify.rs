use crate::error::{AppError, AppResult};
use crate::models::{BookingStatus, NotificationView};
use crate::services::notify::{
    NotificationService, TRAVEL_COMPLETE_MESSAGE, TRAVEL_START_MESSAGE,
};
use crate::services::push::{PushAction, PushData, PushService};
use crate::websocket::hub::BusHub;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    /// Bus the passenger wants to board
    #[validate(range(min = 1))]
    pub bus_id: i32,
    /// Stop the passenger is waiting at
    #[validate(range(min = 1))]
    pub bus_stop_id: i32,
    /// Passenger making the booking
    #[validate(range(min = 1))]
    pub user_id: i32,
    /// Expected arrival time, HH:mm:ss
    pub timing: String,
    /// Note shown to the conductor (1-255 characters)
    #[validate(length(
        min = 1,
        max = 255,
        message = "message is required and must not exceed 255 characters"
    ))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdvanceStatusRequest {
    /// Notification to advance
    #[validate(range(min = 1))]
    pub notification_id: i32,
    /// Bus the conductor is operating
    #[validate(range(min = 1))]
    pub bus_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SavePushTokenRequest {
    /// Passenger the token belongs to
    #[validate(range(min = 1))]
    pub user_id: i32,
    /// Expo device token
    #[validate(length(min = 1))]
    pub expo_push_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TravelEventRequest {
    /// Bus the passenger is traveling on
    #[validate(range(min = 1))]
    pub bus_id: i32,
    /// Passenger to notify
    #[validate(range(min = 1))]
    pub user_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationEnvelope {
    pub message: String,
    pub notification: NotificationView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Fan a notification out to every conductor device in the bus's room.
fn broadcast_notification(hub: &BusHub, view: &NotificationView) {
    let event = serde_json::json!({
        "event": "receiveNotification",
        "data": view,
    });
    hub.broadcast_to_bus(view.bus_id, &event.to_string());
}

/// Status-specific passenger push after a successful advance. A passenger
/// without a registered token is logged and skipped, never an error.
async fn push_status_change(push: &PushService, view: &NotificationView) {
    let Some(token) = view.expo_token.as_deref() else {
        tracing::debug!("No push token for user {}, skipping status push", view.user_id);
        return;
    };

    match view.status {
        BookingStatus::Traveling => {
            let data = PushData {
                action: PushAction::ConfirmTravel,
                bus_id: view.bus_id,
                user_id: view.user_id,
                notification_id: Some(view.id),
            };
            push.send_confirm_travel(token, TRAVEL_START_MESSAGE, data).await;
        }
        BookingStatus::Completed => {
            let data = PushData {
                action: PushAction::TravelComplete,
                bus_id: view.bus_id,
                user_id: view.user_id,
                notification_id: Some(view.id),
            };
            push.send_travel_completed(token, TRAVEL_COMPLETE_MESSAGE, data).await;
        }
        BookingStatus::Waiting => {}
    }
}

#[utoipa::path(
    post,
    path = "/api/notify",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Booking created and broadcast to the bus's conductors", body = NotificationEnvelope),
        (status = 400, description = "Validation failure, unknown reference or duplicate active booking", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn create_notification(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<BusHub>,
    Json(payload): Json<CreateNotificationRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    let notification = service
        .create_booking(
            payload.bus_id,
            payload.bus_stop_id,
            payload.user_id,
            &payload.timing,
            &payload.message,
        )
        .await?;

    broadcast_notification(&hub, &notification);

    Ok((
        StatusCode::CREATED,
        Json(NotificationEnvelope {
            message: "Notification created".to_string(),
            notification,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/notify/conductor/{bus_id}",
    params(("bus_id" = i32, Path, description = "Bus ID")),
    responses(
        (status = 200, description = "All bookings for the bus, newest first; empty list if none", body = Vec<NotificationView>),
    ),
    tag = "notify"
)]
pub async fn conductor_notifications(
    Extension(db): Extension<DatabaseConnection>,
    Path(bus_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(db);
    let notifications = service.bus_notifications(bus_id).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    put,
    path = "/api/notify/markseen",
    request_body = AdvanceStatusRequest,
    responses(
        (status = 200, description = "Status advanced one step; advancing a completed booking is a no-op", body = NotificationEnvelope),
        (status = 404, description = "Notification not found or not owned by this bus", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn mark_seen(
    Extension(db): Extension<DatabaseConnection>,
    Extension(push): Extension<PushService>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    let change = service
        .advance_status(payload.notification_id, payload.bus_id)
        .await?;

    // The race loser and the terminal no-op both skip the passenger push.
    if change.advanced {
        push_status_change(&push, &change.notification).await;
    }

    Ok(Json(NotificationEnvelope {
        message: "Notification status updated".to_string(),
        notification: change.notification,
    }))
}

#[utoipa::path(
    post,
    path = "/api/notify/savePushToken",
    request_body = SavePushTokenRequest,
    responses(
        (status = 200, description = "Token stored on the passenger record", body = MessageResponse),
        (status = 400, description = "Unknown user or malformed token", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn save_push_token(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<SavePushTokenRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    service
        .save_push_token(payload.user_id, &payload.expo_push_token)
        .await?;

    Ok(Json(MessageResponse {
        message: "Push token saved successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/notify/startTravel",
    request_body = TravelEventRequest,
    responses(
        (status = 200, description = "Journey recorded and confirmation push sent", body = MessageResponse),
        (status = 404, description = "Passenger not found", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn start_travel(
    Extension(db): Extension<DatabaseConnection>,
    Extension(push): Extension<PushService>,
    Json(payload): Json<TravelEventRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    let notification = service
        .record_travel_start(payload.bus_id, payload.user_id)
        .await?;

    if let Some(token) = notification.expo_token.as_deref() {
        let data = PushData {
            action: PushAction::ConfirmTravel,
            bus_id: notification.bus_id,
            user_id: notification.user_id,
            notification_id: None,
        };
        push.send_confirm_travel(token, TRAVEL_START_MESSAGE, data).await;
    } else {
        tracing::debug!("No push token for user {}, skipping travel-start push", payload.user_id);
    }

    Ok(Json(MessageResponse {
        message: "Notification sent for confirmation".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/notify/confirmTravel",
    request_body = TravelEventRequest,
    responses(
        (status = 200, description = "Pending travel-start rows resolved and acknowledgment pushed", body = MessageResponse),
        (status = 404, description = "Passenger not found", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn confirm_travel(
    Extension(db): Extension<DatabaseConnection>,
    Extension(push): Extension<PushService>,
    Json(payload): Json<TravelEventRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    let token = service.passenger_token(payload.user_id).await?;
    service.confirm_travel(payload.bus_id, payload.user_id).await?;

    if let Some(token) = token.as_deref() {
        let data = PushData {
            action: PushAction::TravelConfirmed,
            bus_id: payload.bus_id,
            user_id: payload.user_id,
            notification_id: None,
        };
        push.send_travel_confirmed(token, data).await;
    } else {
        tracing::debug!("No push token for user {}, skipping confirmation push", payload.user_id);
    }

    Ok(Json(MessageResponse {
        message: "Travel confirmed successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/notify/completeTravel",
    request_body = TravelEventRequest,
    responses(
        (status = 200, description = "Completion recorded and push sent", body = MessageResponse),
        (status = 404, description = "Passenger not found", body = crate::error::AppError),
    ),
    tag = "notify"
)]
pub async fn complete_travel(
    Extension(db): Extension<DatabaseConnection>,
    Extension(push): Extension<PushService>,
    Json(payload): Json<TravelEventRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = NotificationService::new(db);
    let notification = service
        .record_travel_completion(payload.bus_id, payload.user_id)
        .await?;

    if let Some(token) = notification.expo_token.as_deref() {
        let data = PushData {
            action: PushAction::TravelComplete,
            bus_id: notification.bus_id,
            user_id: notification.user_id,
            notification_id: None,
        };
        push.send_travel_completed(token, TRAVEL_COMPLETE_MESSAGE, data).await;
    } else {
        tracing::debug!("No push token for user {}, skipping completion push", payload.user_id);
    }

    Ok(Json(MessageResponse {
        message: "Travel completion notified successfully".to_string(),
    }))
}
