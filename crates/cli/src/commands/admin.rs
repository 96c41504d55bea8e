//! Account management commands.

use tracing::info;

use chalkbox_server::db;

/// Grant the admin role to the account with the given email.
///
/// # Errors
///
/// Fails when the database is unreachable or no account carries the email.
pub async fn promote(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let result = sqlx::query(
        "UPDATE account SET role = 'admin', updated_at = now() WHERE email = $1",
    )
    .bind(email)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(format!("no account with email {email}").into());
    }

    info!(email, "account promoted to admin");
    Ok(())
}
