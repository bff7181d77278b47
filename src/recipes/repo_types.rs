use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step: String,
}

/// A recipe joined with the columns of its author.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub prep_time: i32,
    pub servings: i32,
    pub description: Option<String>,
    pub image: String,
    pub ingredients: Json<Vec<Ingredient>>,
    pub steps: Json<Vec<Step>>,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_email: String,
    pub created_at: OffsetDateTime,
}

/// Validated input for an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub category: String,
    pub prep_time: i32,
    pub servings: i32,
    pub description: Option<String>,
    pub image: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub prep_time: Option<i32>,
    pub servings: Option<i32>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<Step>>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub category: Option<String>,
    pub author_id: Option<Uuid>,
}
