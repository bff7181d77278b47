use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Category;

pub async fn list_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, author_id, created_at
          FROM categories
         WHERE author_id = $1
         ORDER BY name ASC
        "#,
    )
    .bind(author_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>(
        r#"SELECT id, name, author_id, created_at FROM categories WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// True when `author_id` already owns a category called `name`, ignoring `except`.
pub async fn name_taken(
    db: &PgPool,
    author_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> anyhow::Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM categories
             WHERE author_id = $1 AND name = $2
               AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(author_id)
    .bind(name)
    .bind(except)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

pub async fn insert(db: &PgPool, author_id: Uuid, name: &str) -> anyhow::Result<Category> {
    let row = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, author_id)
        VALUES ($1, $2)
        RETURNING id, name, author_id, created_at
        "#,
    )
    .bind(name)
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn rename(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Category> {
    let row = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories SET name = $2
         WHERE id = $1
        RETURNING id, name, author_id, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn count_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
