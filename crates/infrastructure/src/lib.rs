//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod console_email_service;
mod postgres_access_control_repository;
mod postgres_campaign_repository;
mod postgres_organization_repository;
mod postgres_preferences_repository;
mod postgres_role_admin_repository;
mod postgres_team_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use console_email_service::ConsoleEmailService;
pub use postgres_access_control_repository::PostgresAccessControlRepository;
pub use postgres_campaign_repository::PostgresCampaignRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_preferences_repository::PostgresPreferencesRepository;
pub use postgres_role_admin_repository::PostgresRoleAdminRepository;
pub use postgres_team_repository::PostgresTeamRepository;
pub use postgres_user_repository::PostgresUserRepository;
