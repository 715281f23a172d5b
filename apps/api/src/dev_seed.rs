//! Development fixtures for a local database.

use markops_application::PasswordHasher;
use markops_core::{AppError, AppResult};
use markops_infrastructure::Argon2PasswordHasher;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const SEED_ORGANIZATION_ID: &str = "11111111-1111-1111-1111-111111111111";
const SEED_ORGANIZATION_NAME: &str = "Agency X";
const SEED_ORGANIZATION_DOMAIN: &str = "agencyx.com";

const SEED_ADMIN_USER_ID: &str = "7be4640a-5bc2-4f37-9c82-6c54c7089c6f";
const SEED_ADMIN_EMAIL: &str = "admin@agencyx.com";
const SEED_ADMIN_DISPLAY_NAME: &str = "Agency Admin";
const SEED_ADMIN_PASSWORD: &str = "admin";

/// Inserts a demo organization and a superuser account. Idempotent.
pub async fn run(pool: &PgPool) -> AppResult<()> {
    let organization_id = parse_uuid_const(SEED_ORGANIZATION_ID, "SEED_ORGANIZATION_ID")?;
    let admin_user_id = parse_uuid_const(SEED_ADMIN_USER_ID, "SEED_ADMIN_USER_ID")?;

    sqlx::query(
        "INSERT INTO organizations (id, name, email_domain)
         VALUES ($1, $2, $3)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(organization_id)
    .bind(SEED_ORGANIZATION_NAME)
    .bind(SEED_ORGANIZATION_DOMAIN)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed organization: {error}")))?;

    let password_hash = Argon2PasswordHasher::new().hash(SEED_ADMIN_PASSWORD)?;

    sqlx::query(
        "INSERT INTO users (id, organization_id, email, display_name, password_hash,
                            is_active, is_verified, is_superuser, created_at)
         VALUES ($1, $2, $3, $4, $5, TRUE, TRUE, TRUE, NOW())
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(admin_user_id)
    .bind(organization_id)
    .bind(SEED_ADMIN_EMAIL)
    .bind(SEED_ADMIN_DISPLAY_NAME)
    .bind(password_hash)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed admin user: {error}")))?;

    info!(
        email = SEED_ADMIN_EMAIL,
        organization = SEED_ORGANIZATION_NAME,
        "development fixtures in place"
    );

    Ok(())
}

fn parse_uuid_const(value: &str, name: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|error| AppError::Internal(format!("invalid {name}: {error}")))
}
