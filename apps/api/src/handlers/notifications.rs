use super::*;

use markops_application::{NotificationSettingRecord, PreferencesInput};
use markops_domain::NotificationTrigger;

pub async fn get_preferences_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<PreferencesResponse>> {
    let preferences = state
        .notification_service
        .get_preferences(UserId::from_uuid(user.user_id()))
        .await?;

    Ok(Json(PreferencesResponse::from(&preferences)))
}

pub async fn update_preferences_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<PreferencesRequest>,
) -> ApiResult<Json<PreferencesResponse>> {
    let quiet_hours_start = payload
        .quiet_hours_start
        .as_deref()
        .map(|value| parse_time(value, "quiet_hours_start"))
        .transpose()?;
    let quiet_hours_end = payload
        .quiet_hours_end
        .as_deref()
        .map(|value| parse_time(value, "quiet_hours_end"))
        .transpose()?;

    let preferences = state
        .notification_service
        .update_preferences(
            UserId::from_uuid(user.user_id()),
            PreferencesInput {
                timezone: payload.timezone,
                language: payload.language,
                quiet_hours_start,
                quiet_hours_end,
                frequency: payload.frequency,
            },
        )
        .await?;

    Ok(Json(PreferencesResponse::from(&preferences)))
}

pub async fn list_notification_settings_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<NotificationSettingResponse>>> {
    let settings = state
        .notification_service
        .list_settings(UserId::from_uuid(user.user_id()))
        .await?
        .iter()
        .map(NotificationSettingResponse::from)
        .collect();

    Ok(Json(settings))
}

pub async fn update_notification_setting_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<NotificationSettingRequest>,
) -> ApiResult<StatusCode> {
    let trigger = payload.trigger.parse::<NotificationTrigger>()?;

    state
        .notification_service
        .update_setting(NotificationSettingRecord {
            user_id: UserId::from_uuid(user.user_id()),
            trigger,
            in_app_enabled: payload.in_app_enabled,
            email_enabled: payload.email_enabled,
            slack_enabled: payload.slack_enabled,
            slack_channel_id: payload.slack_channel_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn test_dispatch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<TestDispatchRequest>,
) -> ApiResult<Json<DispatchReportResponse>> {
    let trigger = payload.trigger.parse::<NotificationTrigger>()?;

    let report = state
        .notification_service
        .dispatch_mock(UserId::from_uuid(user.user_id()), trigger, Utc::now())
        .await?;

    Ok(Json(DispatchReportResponse::from(&report)))
}
