use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Ingredient, RecipeRow, Step};

#[derive(Debug, Serialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub prep_time: i32,
    pub servings: i32,
    pub description: Option<String>,
    pub image: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub author: AuthorSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<RecipeRow> for RecipeResponse {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            category: r.category,
            prep_time: r.prep_time,
            servings: r.servings,
            description: r.description,
            image: r.image,
            ingredients: r.ingredients.0,
            steps: r.steps.0,
            author: AuthorSummary {
                id: r.author_id,
                username: r.author_username,
                email: r.author_email,
            },
            created_at: r.created_at,
        }
    }
}

/// `GET /recipes?category=&userId=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeQuery {
    pub category: Option<String>,
    pub user_id: Option<String>,
}

/// Numbers arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub prep_time: Option<Count>,
    pub servings: Option<Count>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub steps: Option<Vec<Step>>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Raw multipart fields of `POST /recipes`.
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub prep_time: Option<String>,
    pub servings: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
    pub file: Option<UploadedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::datetime;

    #[test]
    fn response_nests_author_and_uses_camel_case() {
        let author_id = Uuid::new_v4();
        let row = RecipeRow {
            id: Uuid::new_v4(),
            title: "Olivier".into(),
            category: "Salads".into(),
            prep_time: 40,
            servings: 6,
            description: None,
            image: "abc.jpg".into(),
            ingredients: Json(vec![Ingredient { name: "peas".into(), quantity: "1 can".into() }]),
            steps: Json(vec![Step { step: "Chop everything".into() }]),
            author_id,
            author_username: "chef".into(),
            author_email: "chef@example.com".into(),
            created_at: datetime!(2024-06-15 12:00 UTC),
        };

        let json = serde_json::to_value(RecipeResponse::from(row)).unwrap();
        assert_eq!(json["prepTime"], 40);
        assert_eq!(json["author"]["id"], author_id.to_string());
        assert_eq!(json["author"]["username"], "chef");
        assert_eq!(json["ingredients"][0]["quantity"], "1 can");
        assert_eq!(json["steps"][0]["step"], "Chop everything");
        assert_eq!(json["createdAt"], "2024-06-15T12:00:00Z");
    }
}
