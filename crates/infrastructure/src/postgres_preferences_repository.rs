//! PostgreSQL-backed repository for notification preferences,
//! per-trigger settings, and Slack integrations.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveTime;
use markops_application::{
    NotificationSettingRecord, PreferencesRepository, SlackIntegrationRecord,
};
use markops_core::{AppError, AppResult};
use markops_domain::{NotificationTrigger, UserId, UserPreferences};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL implementation of the preferences port.
#[derive(Clone)]
pub struct PostgresPreferencesRepository {
    pool: PgPool,
}

impl PostgresPreferencesRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PreferencesRow {
    user_id: Uuid,
    timezone: Option<String>,
    language: Option<String>,
    quiet_hours_start: Option<NaiveTime>,
    quiet_hours_end: Option<NaiveTime>,
    frequency: Option<String>,
}

impl From<PreferencesRow> for UserPreferences {
    fn from(row: PreferencesRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            timezone: row.timezone,
            language: row.language,
            quiet_hours_start: row.quiet_hours_start,
            quiet_hours_end: row.quiet_hours_end,
            frequency: row.frequency,
        }
    }
}

#[derive(Debug, FromRow)]
struct SettingRow {
    user_id: Uuid,
    trigger_key: String,
    in_app_enabled: bool,
    email_enabled: bool,
    slack_enabled: bool,
    slack_channel_id: Option<i64>,
}

impl SettingRow {
    fn into_record(self) -> AppResult<NotificationSettingRecord> {
        let trigger = NotificationTrigger::from_str(self.trigger_key.as_str()).map_err(
            |error| {
                AppError::Internal(format!(
                    "invalid trigger key '{}' for user '{}': {error}",
                    self.trigger_key, self.user_id
                ))
            },
        )?;

        Ok(NotificationSettingRecord {
            user_id: UserId::from_uuid(self.user_id),
            trigger,
            in_app_enabled: self.in_app_enabled,
            email_enabled: self.email_enabled,
            slack_enabled: self.slack_enabled,
            slack_channel_id: self.slack_channel_id,
        })
    }
}

#[async_trait]
impl PreferencesRepository for PostgresPreferencesRepository {
    async fn find_preferences(&self, user_id: UserId) -> AppResult<Option<UserPreferences>> {
        let row = sqlx::query_as::<_, PreferencesRow>(
            r#"
            SELECT user_id, timezone, language, quiet_hours_start, quiet_hours_end, frequency
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load preferences: {error}")))?;

        Ok(row.map(UserPreferences::from))
    }

    async fn upsert_preferences(&self, preferences: &UserPreferences) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (
                user_id, timezone, language, quiet_hours_start, quiet_hours_end, frequency
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                timezone = EXCLUDED.timezone,
                language = EXCLUDED.language,
                quiet_hours_start = EXCLUDED.quiet_hours_start,
                quiet_hours_end = EXCLUDED.quiet_hours_end,
                frequency = EXCLUDED.frequency
            "#,
        )
        .bind(preferences.user_id.as_uuid())
        .bind(preferences.timezone.as_deref())
        .bind(preferences.language.as_deref())
        .bind(preferences.quiet_hours_start)
        .bind(preferences.quiet_hours_end)
        .bind(preferences.frequency.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save preferences: {error}")))?;

        Ok(())
    }

    async fn list_settings(&self, user_id: UserId) -> AppResult<Vec<NotificationSettingRecord>> {
        let rows = sqlx::query_as::<_, SettingRow>(
            r#"
            SELECT user_id, trigger_key, in_app_enabled, email_enabled,
                   slack_enabled, slack_channel_id
            FROM notification_settings
            WHERE user_id = $1
            ORDER BY trigger_key
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list notification settings: {error}"))
        })?;

        rows.into_iter().map(SettingRow::into_record).collect()
    }

    async fn upsert_setting(&self, setting: &NotificationSettingRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_settings (
                user_id, trigger_key, in_app_enabled, email_enabled,
                slack_enabled, slack_channel_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, trigger_key) DO UPDATE SET
                in_app_enabled = EXCLUDED.in_app_enabled,
                email_enabled = EXCLUDED.email_enabled,
                slack_enabled = EXCLUDED.slack_enabled,
                slack_channel_id = EXCLUDED.slack_channel_id
            "#,
        )
        .bind(setting.user_id.as_uuid())
        .bind(setting.trigger.setting_key())
        .bind(setting.in_app_enabled)
        .bind(setting.email_enabled)
        .bind(setting.slack_enabled)
        .bind(setting.slack_channel_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save notification setting: {error}"))
        })?;

        Ok(())
    }

    async fn find_slack_integration(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<SlackIntegrationRecord>> {
        #[derive(Debug, FromRow)]
        struct IntegrationRow {
            user_id: Uuid,
            channel_id: i64,
            is_active: bool,
        }

        let row = sqlx::query_as::<_, IntegrationRow>(
            r#"
            SELECT user_id, channel_id, is_active
            FROM slack_integrations
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load slack integration: {error}"))
        })?;

        Ok(row.map(|row| SlackIntegrationRecord {
            user_id: UserId::from_uuid(row.user_id),
            channel_id: row.channel_id,
            is_active: row.is_active,
        }))
    }
}
