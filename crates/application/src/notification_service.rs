//! Notification preference ports and the mocked dispatcher.
//!
//! No notification ever leaves the system: dispatch produces a report
//! of what would have been sent, one log line per channel, so the
//! preference and quiet-hours logic can be exercised end to end.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use markops_core::{AppError, AppResult};
use markops_domain::{
    NotificationTrigger, UserId, UserPreferences, notification_permission_requirement,
};

use crate::role_admin_service::RoleAdminRepository;
use crate::user_service::UserRepository;

/// Slack channel id reserved for the workspace default channel; posting
/// to it requires an active integration.
const SLACK_DEFAULT_CHANNEL_ID: i64 = 1;

/// Input payload for updating preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferencesInput {
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// Preferred locale code.
    pub language: Option<String>,
    /// Quiet-hours start, local time.
    pub quiet_hours_start: Option<NaiveTime>,
    /// Quiet-hours end, local time.
    pub quiet_hours_end: Option<NaiveTime>,
    /// Digest frequency keyword.
    pub frequency: Option<String>,
}

/// Per-trigger channel toggles for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSettingRecord {
    /// Owning user.
    pub user_id: UserId,
    /// Trigger the setting applies to.
    pub trigger: NotificationTrigger,
    /// Deliver in-app.
    pub in_app_enabled: bool,
    /// Deliver by email.
    pub email_enabled: bool,
    /// Deliver to Slack.
    pub slack_enabled: bool,
    /// Target Slack channel when Slack delivery is enabled.
    pub slack_channel_id: Option<i64>,
}

/// Stored Slack workspace integration for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SlackIntegrationRecord {
    /// Owning user.
    pub user_id: UserId,
    /// Workspace channel the integration targets.
    pub channel_id: i64,
    /// Inactive integrations block delivery to the default channel.
    pub is_active: bool,
}

/// Outcome of a mock dispatch run.
#[derive(Debug, Clone, PartialEq)]
pub struct MockDispatchReport {
    /// Whether the user's quiet hours suppressed delivery.
    pub quiet_hours_active: bool,
    /// Channel names that would have received the notification.
    pub channels_would_notify: Vec<String>,
    /// One line per simulated delivery decision.
    pub mock_logs: Vec<String>,
    /// Human-readable result line.
    pub summary: String,
}

/// Repository port for preferences, settings, and Slack integrations.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Finds stored preferences for a user.
    async fn find_preferences(&self, user_id: UserId) -> AppResult<Option<UserPreferences>>;

    /// Inserts or replaces a user's preferences.
    async fn upsert_preferences(&self, preferences: &UserPreferences) -> AppResult<()>;

    /// Lists a user's notification settings.
    async fn list_settings(&self, user_id: UserId) -> AppResult<Vec<NotificationSettingRecord>>;

    /// Inserts or replaces the setting for (user, trigger).
    async fn upsert_setting(&self, setting: &NotificationSettingRecord) -> AppResult<()>;

    /// Finds a user's Slack integration, if one is configured.
    async fn find_slack_integration(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<SlackIntegrationRecord>>;
}

/// Application service for notification preferences and mock dispatch.
#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    roles: Arc<dyn RoleAdminRepository>,
}

impl NotificationService {
    /// Creates a new service from its ports.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        roles: Arc<dyn RoleAdminRepository>,
    ) -> Self {
        Self {
            users,
            preferences,
            roles,
        }
    }

    /// Returns stored preferences, or defaults when none were saved.
    pub async fn get_preferences(&self, user_id: UserId) -> AppResult<UserPreferences> {
        self.require_user(user_id).await?;
        Ok(self
            .preferences
            .find_preferences(user_id)
            .await?
            .unwrap_or(UserPreferences {
                user_id,
                timezone: None,
                language: None,
                quiet_hours_start: None,
                quiet_hours_end: None,
                frequency: None,
            }))
    }

    /// Replaces a user's preferences.
    pub async fn update_preferences(
        &self,
        user_id: UserId,
        input: PreferencesInput,
    ) -> AppResult<UserPreferences> {
        self.require_user(user_id).await?;

        if input.quiet_hours_start.is_some() != input.quiet_hours_end.is_some() {
            return Err(AppError::Validation(
                "quiet hours require both a start and an end".to_owned(),
            ));
        }

        let preferences = UserPreferences {
            user_id,
            timezone: input.timezone,
            language: input.language,
            quiet_hours_start: input.quiet_hours_start,
            quiet_hours_end: input.quiet_hours_end,
            frequency: input.frequency,
        };
        self.preferences.upsert_preferences(&preferences).await?;
        Ok(preferences)
    }

    /// Lists a user's notification settings.
    pub async fn list_settings(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<NotificationSettingRecord>> {
        self.require_user(user_id).await?;
        self.preferences.list_settings(user_id).await
    }

    /// Inserts or replaces a notification setting.
    ///
    /// Triggers scoped to a module may only be enabled by users holding
    /// the matching VIEW permission.
    pub async fn update_setting(&self, setting: NotificationSettingRecord) -> AppResult<()> {
        self.require_user(setting.user_id).await?;

        let any_channel_enabled =
            setting.in_app_enabled || setting.email_enabled || setting.slack_enabled;
        let requirement = notification_permission_requirement(
            setting.trigger.setting_key(),
            setting.trigger.module_scope(),
        );

        if let Some(required) = requirement.filter(|_| any_channel_enabled) {
            let held = self
                .roles
                .list_effective_permissions(setting.user_id, Utc::now())
                .await?;
            let holds_required = held.iter().any(|permission| {
                permission.module == required.module
                    && permission.action == required.action.as_str()
            });
            if !holds_required {
                return Err(AppError::Forbidden(format!(
                    "enabling this notification requires the '{required}' permission"
                )));
            }
        }

        self.preferences.upsert_setting(&setting).await
    }

    /// Simulates dispatching a trigger for a user and reports what
    /// would have happened.
    pub async fn dispatch_mock(
        &self,
        user_id: UserId,
        trigger: NotificationTrigger,
        now: DateTime<Utc>,
    ) -> AppResult<MockDispatchReport> {
        let user = self.require_user(user_id).await?;
        let preferences = self.get_preferences(user_id).await?;

        let mut logs = Vec::new();

        if preferences.is_in_quiet_hours(now) {
            logs.push(format!(
                "[MOCK NOTIFICATION] quiet hours active for user {user_id}, skipping '{}'",
                trigger.setting_key()
            ));
            return Ok(MockDispatchReport {
                quiet_hours_active: true,
                channels_would_notify: vec![],
                mock_logs: logs,
                summary: "Would notify 0 channel(s)".to_owned(),
            });
        }

        let settings = self.preferences.list_settings(user_id).await?;
        let setting = settings
            .into_iter()
            .find(|setting| setting.trigger == trigger);

        let mut channels = Vec::new();
        if let Some(setting) = setting {
            if setting.in_app_enabled {
                logs.push(format!(
                    "[MOCK NOTIFICATION] would create in-app notification '{}' for user {user_id}",
                    trigger.setting_key()
                ));
                channels.push("in_app".to_owned());
            }

            if setting.email_enabled {
                logs.push(format!(
                    "[MOCK EMAIL] would send '{}' email to {}",
                    trigger.setting_key(),
                    user.email
                ));
                channels.push("email".to_owned());
            }

            if setting.slack_enabled {
                let channel_id = setting.slack_channel_id.unwrap_or(SLACK_DEFAULT_CHANNEL_ID);
                if self.slack_channel_available(user_id, channel_id).await? {
                    logs.push(format!(
                        "[MOCK SLACK] would post '{}' to channel {channel_id}",
                        trigger.setting_key()
                    ));
                    channels.push("slack".to_owned());
                } else {
                    logs.push(format!(
                        "[MOCK SLACK] no active integration for channel {channel_id}, skipping"
                    ));
                }
            }
        }

        let summary = format!("Would notify {} channel(s)", channels.len());
        Ok(MockDispatchReport {
            quiet_hours_active: false,
            channels_would_notify: channels,
            mock_logs: logs,
            summary,
        })
    }

    /// The default channel needs an active integration; other channel
    /// ids are assumed reachable.
    async fn slack_channel_available(&self, user_id: UserId, channel_id: i64) -> AppResult<bool> {
        if channel_id != SLACK_DEFAULT_CHANNEL_ID {
            return Ok(true);
        }

        Ok(self
            .preferences
            .find_slack_integration(user_id)
            .await?
            .is_some_and(|integration| integration.is_active))
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<crate::user_service::UserRecord> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};
    use markops_core::{AppError, AppResult, OrganizationId};
    use markops_domain::{NotificationTrigger, PermissionKey, UserId, UserPreferences};
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::role_admin_service::{
        AssignUserRoleInput, PermissionRecord, RoleAdminRepository, RoleRecord, UserRoleAssignment,
    };
    use crate::user_service::{UserRecord, UserRepository};

    use super::{
        MockDispatchReport, NotificationService, NotificationSettingRecord, PreferencesInput,
        PreferencesRepository, SlackIntegrationRecord,
    };

    #[derive(Default)]
    struct FakeUserRepository {
        users: Mutex<HashMap<UserId, UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn insert(&self, user: &UserRecord) -> AppResult<()> {
            self.users.lock().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self.users.lock().await.get(&user_id).cloned())
        }

        async fn find_by_email(&self, _: &str) -> AppResult<Option<UserRecord>> {
            Ok(None)
        }

        async fn find_by_verification_token(&self, _: &str) -> AppResult<Option<UserRecord>> {
            Ok(None)
        }

        async fn update(&self, user: &UserRecord) -> AppResult<()> {
            self.users.lock().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn list_active_role_names(
            &self,
            _: UserId,
            _: DateTime<Utc>,
        ) -> AppResult<Vec<String>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakePreferencesRepository {
        preferences: Mutex<HashMap<UserId, UserPreferences>>,
        settings: Mutex<Vec<NotificationSettingRecord>>,
        integrations: Mutex<Vec<SlackIntegrationRecord>>,
    }

    #[async_trait]
    impl PreferencesRepository for FakePreferencesRepository {
        async fn find_preferences(&self, user_id: UserId) -> AppResult<Option<UserPreferences>> {
            Ok(self.preferences.lock().await.get(&user_id).cloned())
        }

        async fn upsert_preferences(&self, preferences: &UserPreferences) -> AppResult<()> {
            self.preferences
                .lock()
                .await
                .insert(preferences.user_id, preferences.clone());
            Ok(())
        }

        async fn list_settings(
            &self,
            user_id: UserId,
        ) -> AppResult<Vec<NotificationSettingRecord>> {
            Ok(self
                .settings
                .lock()
                .await
                .iter()
                .filter(|setting| setting.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn upsert_setting(&self, setting: &NotificationSettingRecord) -> AppResult<()> {
            let mut settings = self.settings.lock().await;
            settings.retain(|existing| {
                !(existing.user_id == setting.user_id && existing.trigger == setting.trigger)
            });
            settings.push(setting.clone());
            Ok(())
        }

        async fn find_slack_integration(
            &self,
            user_id: UserId,
        ) -> AppResult<Option<SlackIntegrationRecord>> {
            Ok(self
                .integrations
                .lock()
                .await
                .iter()
                .find(|integration| integration.user_id == user_id)
                .cloned())
        }
    }

    #[derive(Default)]
    struct FakeRoleRepository {
        effective: Mutex<Vec<PermissionRecord>>,
    }

    #[async_trait]
    impl RoleAdminRepository for FakeRoleRepository {
        async fn list_roles(&self, _: OrganizationId) -> AppResult<Vec<RoleRecord>> {
            Ok(vec![])
        }

        async fn find_role_by_name(
            &self,
            _: OrganizationId,
            _: &str,
        ) -> AppResult<Option<RoleRecord>> {
            Ok(None)
        }

        async fn create_role(
            &self,
            organization_id: OrganizationId,
            name: &str,
            level: i32,
        ) -> AppResult<RoleRecord> {
            Ok(RoleRecord {
                id: Uuid::new_v4(),
                organization_id,
                name: name.to_owned(),
                level,
            })
        }

        async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionRecord>> {
            Ok(vec![])
        }

        async fn find_permission(
            &self,
            _: &PermissionKey,
        ) -> AppResult<Option<PermissionRecord>> {
            Ok(None)
        }

        async fn list_role_grants(&self, _: Uuid) -> AppResult<Vec<PermissionRecord>> {
            Ok(vec![])
        }

        async fn grant_permission(&self, _: Uuid, _: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn revoke_permission(&self, _: Uuid, _: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn list_user_roles(&self, _: UserId) -> AppResult<Vec<UserRoleAssignment>> {
            Ok(vec![])
        }

        async fn assign_role(&self, _: AssignUserRoleInput) -> AppResult<()> {
            Ok(())
        }

        async fn unassign_role(&self, _: UserId, _: Uuid, _: Option<Uuid>) -> AppResult<()> {
            Ok(())
        }

        async fn list_effective_permissions(
            &self,
            _: UserId,
            _: DateTime<Utc>,
        ) -> AppResult<Vec<PermissionRecord>> {
            Ok(self.effective.lock().await.clone())
        }
    }

    struct Harness {
        users: Arc<FakeUserRepository>,
        preferences: Arc<FakePreferencesRepository>,
        roles: Arc<FakeRoleRepository>,
        service: NotificationService,
        user_id: UserId,
    }

    async fn harness() -> Harness {
        let users = Arc::new(FakeUserRepository::default());
        let preferences = Arc::new(FakePreferencesRepository::default());
        let roles = Arc::new(FakeRoleRepository::default());
        let service =
            NotificationService::new(users.clone(), preferences.clone(), roles.clone());

        let user_id = UserId::new();
        let inserted = users
            .insert(&UserRecord {
                id: user_id,
                organization_id: None,
                email: "buyer@testagency.com".to_owned(),
                display_name: "Buyer".to_owned(),
                password_hash: None,
                is_active: true,
                is_verified: true,
                is_superuser: false,
                verification_token: None,
                created_at: Utc::now(),
            })
            .await;
        assert!(inserted.is_ok());

        Harness {
            users,
            preferences,
            roles,
            service,
            user_id,
        }
    }

    fn setting(user_id: UserId, trigger: NotificationTrigger) -> NotificationSettingRecord {
        NotificationSettingRecord {
            user_id,
            trigger,
            in_app_enabled: true,
            email_enabled: true,
            slack_enabled: false,
            slack_channel_id: None,
        }
    }

    fn time(hour: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, 0, 0)
    }

    async fn report_for(
        harness: &Harness,
        trigger: NotificationTrigger,
        now: DateTime<Utc>,
    ) -> Option<MockDispatchReport> {
        harness
            .service
            .dispatch_mock(harness.user_id, trigger, now)
            .await
            .ok()
    }

    #[tokio::test]
    async fn dispatch_for_unknown_user_is_not_found() {
        let harness = harness().await;
        let result = harness
            .service
            .dispatch_mock(UserId::new(), NotificationTrigger::TaskDue, Utc::now())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn quiet_hours_suppress_all_channels() {
        let harness = harness().await;
        let updated = harness
            .service
            .update_preferences(
                harness.user_id,
                PreferencesInput {
                    timezone: Some("UTC".to_owned()),
                    quiet_hours_start: time(22),
                    quiet_hours_end: time(8),
                    ..PreferencesInput::default()
                },
            )
            .await;
        assert!(updated.is_ok());

        harness
            .preferences
            .settings
            .lock()
            .await
            .push(setting(harness.user_id, NotificationTrigger::TaskDue));

        let midnight = Utc.with_ymd_and_hms(2026, 3, 1, 0, 30, 0).single();
        let Some(midnight) = midnight else { return };

        let report = report_for(&harness, NotificationTrigger::TaskDue, midnight).await;
        let Some(report) = report else {
            unreachable!("dispatch failed")
        };
        assert!(report.quiet_hours_active);
        assert!(report.channels_would_notify.is_empty());
        assert_eq!(report.summary, "Would notify 0 channel(s)");
    }

    #[tokio::test]
    async fn enabled_channels_are_reported() {
        let harness = harness().await;
        harness
            .preferences
            .settings
            .lock()
            .await
            .push(setting(harness.user_id, NotificationTrigger::TaskDue));

        let report = report_for(&harness, NotificationTrigger::TaskDue, Utc::now()).await;
        let Some(report) = report else {
            unreachable!("dispatch failed")
        };
        assert_eq!(report.channels_would_notify, vec!["in_app", "email"]);
        assert_eq!(report.summary, "Would notify 2 channel(s)");
        assert!(report
            .mock_logs
            .iter()
            .any(|line| line.starts_with("[MOCK EMAIL]")));
    }

    #[tokio::test]
    async fn default_slack_channel_requires_active_integration() {
        let harness = harness().await;
        let mut slack_setting = setting(harness.user_id, NotificationTrigger::TaskDue);
        slack_setting.in_app_enabled = false;
        slack_setting.email_enabled = false;
        slack_setting.slack_enabled = true;
        slack_setting.slack_channel_id = Some(1);
        harness.preferences.settings.lock().await.push(slack_setting);

        let without = report_for(&harness, NotificationTrigger::TaskDue, Utc::now()).await;
        assert_eq!(
            without.map(|report| report.channels_would_notify),
            Some(vec![])
        );

        harness
            .preferences
            .integrations
            .lock()
            .await
            .push(SlackIntegrationRecord {
                user_id: harness.user_id,
                channel_id: 1,
                is_active: true,
            });

        let with = report_for(&harness, NotificationTrigger::TaskDue, Utc::now()).await;
        assert_eq!(
            with.map(|report| report.channels_would_notify),
            Some(vec!["slack".to_owned()])
        );
    }

    #[tokio::test]
    async fn module_scoped_setting_requires_permission() {
        let harness = harness().await;

        let denied = harness
            .service
            .update_setting(setting(harness.user_id, NotificationTrigger::CampaignFailure))
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        harness
            .roles
            .effective
            .lock()
            .await
            .push(PermissionRecord {
                id: Uuid::new_v4(),
                module: "CAMPAIGN".to_owned(),
                action: "VIEW".to_owned(),
            });

        let allowed = harness
            .service
            .update_setting(setting(harness.user_id, NotificationTrigger::CampaignFailure))
            .await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    async fn general_trigger_needs_no_permission() {
        let harness = harness().await;
        let result = harness
            .service
            .update_setting(setting(harness.user_id, NotificationTrigger::TaskDue))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn partial_quiet_hours_are_rejected() {
        let harness = harness().await;
        let result = harness
            .service
            .update_preferences(
                harness.user_id,
                PreferencesInput {
                    quiet_hours_start: time(22),
                    ..PreferencesInput::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn preferences_default_when_unset() {
        let harness = harness().await;
        let preferences = harness.service.get_preferences(harness.user_id).await;
        assert_eq!(
            preferences.ok().map(|value| value.timezone),
            Some(None)
        );
    }
}
