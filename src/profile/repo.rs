use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

/// Column values to overwrite; `None` keeps the stored value.
#[derive(Debug, Default, PartialEq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub password_hash: Option<String>,
}

pub async fn update_user(db: &PgPool, id: Uuid, changes: ProfileChanges) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE users SET
            username      = COALESCE($2, username),
            email         = COALESCE($3, email),
            phone         = COALESCE($4, phone),
            birth_date    = COALESCE($5, birth_date),
            password_hash = COALESCE($6, password_hash)
         WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(changes.username)
    .bind(changes.email)
    .bind(changes.phone)
    .bind(changes.birth_date)
    .bind(changes.password_hash)
    .execute(db)
    .await?;
    Ok(())
}
