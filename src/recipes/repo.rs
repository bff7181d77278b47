use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{NewRecipe, RecipeChanges, RecipeFilter, RecipeRow};

/// Column list shared by every query returning a `RecipeRow`; expects the
/// recipe aliased as `r` and its author as `u`.
const ROW_COLUMNS: &str = r#"
    r.id, r.title, r.category, r.prep_time, r.servings, r.description, r.image,
    r.ingredients, r.steps, r.author_id,
    u.username AS author_username, u.email AS author_email,
    r.created_at
"#;

pub async fn list(db: &PgPool, filter: &RecipeFilter) -> anyhow::Result<Vec<RecipeRow>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {ROW_COLUMNS}
          FROM recipes r
          JOIN users u ON u.id = r.author_id
         WHERE ($1::text IS NULL OR r.category = $1)
           AND ($2::uuid IS NULL OR r.author_id = $2)
         ORDER BY r.created_at DESC
        "#
    ))
    .bind(filter.category.as_deref())
    .bind(filter.author_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {ROW_COLUMNS}
          FROM recipes r
          JOIN users u ON u.id = r.author_id
         WHERE r.id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Author and stored image name of a recipe, for ownership checks.
pub async fn find_owner(db: &PgPool, id: Uuid) -> anyhow::Result<Option<(Uuid, String)>> {
    let row = sqlx::query_as::<_, (Uuid, String)>(
        r#"SELECT author_id, image FROM recipes WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, author_id: Uuid, recipe: NewRecipe) -> anyhow::Result<RecipeRow> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        WITH r AS (
            INSERT INTO recipes
                (title, category, prep_time, servings, description, image,
                 ingredients, steps, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
        )
        SELECT {ROW_COLUMNS}
          FROM r
          JOIN users u ON u.id = r.author_id
        "#
    ))
    .bind(recipe.title)
    .bind(recipe.category)
    .bind(recipe.prep_time)
    .bind(recipe.servings)
    .bind(recipe.description)
    .bind(recipe.image)
    .bind(Json(recipe.ingredients))
    .bind(Json(recipe.steps))
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, changes: RecipeChanges) -> anyhow::Result<RecipeRow> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        WITH r AS (
            UPDATE recipes SET
                title       = COALESCE($2, title),
                category    = COALESCE($3, category),
                prep_time   = COALESCE($4, prep_time),
                servings    = COALESCE($5, servings),
                description = CASE WHEN $6 THEN $7 ELSE description END,
                ingredients = COALESCE($8, ingredients),
                steps       = COALESCE($9, steps)
             WHERE id = $1
            RETURNING *
        )
        SELECT {ROW_COLUMNS}
          FROM r
          JOIN users u ON u.id = r.author_id
        "#
    ))
    .bind(id)
    .bind(changes.title)
    .bind(changes.category)
    .bind(changes.prep_time)
    .bind(changes.servings)
    .bind(changes.description.is_some())
    .bind(changes.description.flatten())
    .bind(changes.ingredients.map(Json))
    .bind(changes.steps.map(Json))
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn count_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
