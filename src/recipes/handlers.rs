use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{RecipeForm, RecipeQuery, RecipeResponse, UpdateRecipeRequest, UploadedFile};
use super::{repo, services};
use crate::{
    auth::{services::ensure_owner, AuthUser},
    error::{AppError, AppResult},
    extractors::{AppJson, AppPath, AppQuery},
    images::services::save_image,
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", put(update_recipe).delete(delete_recipe))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeQuery>,
) -> AppResult<Json<Vec<RecipeResponse>>> {
    let filter = services::parse_filter(query)?;
    let rows = repo::list(&state.db, &filter).await?;
    Ok(Json(rows.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<RecipeResponse>> {
    let row = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    Ok(Json(row.into()))
}

/// POST /recipes (multipart): text fields plus an optional `file` image.
#[instrument(skip(state, mp))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let form = read_form(mp?).await?;
    let (mut recipe, file) = services::validate_form(form).map_err(|e| {
        warn!(%user_id, error = %e, "rejected recipe form");
        e
    })?;

    // The file lands on disk before the row exists; an insert failure orphans it.
    if let Some(file) = file {
        recipe.image = save_image(
            &state,
            file.file_name.as_deref(),
            file.content_type.as_deref(),
            file.body,
        )
        .await?;
    }

    let row = repo::insert(&state.db, user_id, recipe).await.map_err(|e| {
        warn!(%user_id, "recipe insert failed; uploaded image may be orphaned");
        AppError::Internal(e)
    })?;

    info!(%user_id, recipe_id = %row.id, "recipe created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> AppResult<Json<RecipeResponse>> {
    let (author_id, _) = repo::find_owner(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    ensure_owner(author_id, user_id, "recipe")?;

    let changes = services::validate_changes(payload)?;
    let row = repo::update(&state.db, id, changes).await?;

    info!(%user_id, recipe_id = %id, "recipe updated");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let (author_id, image) = repo::find_owner(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    ensure_owner(author_id, user_id, "recipe")?;

    repo::delete(&state.db, id).await?;

    if !image.is_empty() {
        if let Err(e) = state.storage.delete_object(&image).await {
            warn!(error = %e, %image, "could not remove recipe image");
        }
    }

    info!(%user_id, recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn read_form(mut mp: Multipart) -> AppResult<RecipeForm> {
    let mut form = RecipeForm::default();
    while let Some(field) = mp.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let body = field.bytes().await.map_err(malformed)?;
            form.file = Some(UploadedFile {
                file_name,
                content_type,
                body,
            });
            continue;
        }
        let slot = match name.as_str() {
            "title" => &mut form.title,
            "category" => &mut form.category,
            "description" => &mut form.description,
            "prepTime" => &mut form.prep_time,
            "servings" => &mut form.servings,
            "ingredients" => &mut form.ingredients,
            "steps" => &mut form.steps,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(malformed)?);
    }
    Ok(form)
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "malformed multipart body");
    AppError::validation("Malformed multipart body")
}

#[cfg(test)]
mod form_tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    async fn multipart(body: &str) -> Multipart {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "multipart/form-data; boundary=XYZ")
            .body(Body::from(body.replace('\n', "\r\n")))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    #[tokio::test]
    async fn read_form_maps_camel_case_fields() {
        let mp = multipart(
            "--XYZ
Content-Disposition: form-data; name=\"title\"

Borscht
--XYZ
Content-Disposition: form-data; name=\"prepTime\"

90
--XYZ
Content-Disposition: form-data; name=\"servings\"

6
--XYZ
Content-Disposition: form-data; name=\"ingredients\"

[{\"name\":\"beet\"}]
--XYZ
Content-Disposition: form-data; name=\"unknown\"

ignored
--XYZ
Content-Disposition: form-data; name=\"file\"; filename=\"soup.png\"
Content-Type: image/png

PNG
--XYZ--
",
        )
        .await;

        let form = read_form(mp).await.unwrap();
        assert_eq!(form.title.as_deref(), Some("Borscht"));
        assert_eq!(form.prep_time.as_deref(), Some("90"));
        assert_eq!(form.servings.as_deref(), Some("6"));
        assert_eq!(form.ingredients.as_deref(), Some(r#"[{"name":"beet"}]"#));
        assert!(form.category.is_none());
        assert!(form.steps.is_none());

        let file = form.file.unwrap();
        assert_eq!(file.file_name.as_deref(), Some("soup.png"));
        assert_eq!(file.content_type.as_deref(), Some("image/png"));
        assert_eq!(&file.body[..], b"PNG");
    }

    #[tokio::test]
    async fn truncated_body_is_a_validation_error() {
        let mp = multipart("--XYZ\nContent-Disposition: form-data; name=\"title\"\n\nBorscht").await;
        let err = read_form(mp).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
