use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, phone, email, password_hash, birth_date, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// True when either the email or the phone number is already registered.
    pub async fn email_or_phone_taken(db: &PgPool, email: &str, phone: &str) -> anyhow::Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR phone = $2)
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        phone: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, phone, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(phone)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
