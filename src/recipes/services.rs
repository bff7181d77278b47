use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::dto::{Count, RecipeForm, RecipeQuery, UpdateRecipeRequest, UploadedFile};
use super::repo_types::{Ingredient, NewRecipe, RecipeChanges, RecipeFilter, Step};
use crate::error::AppError;

fn invalid(field: &str) -> AppError {
    AppError::validation(format!("Invalid data: check the `{field}` field"))
}

fn non_blank(field: &str, value: Option<String>) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| invalid(field))
}

/// Minutes or servings: a non-negative integer, given as a number or a numeric string.
pub fn parse_count(field: &str, raw: &Count) -> Result<i32, AppError> {
    let value = match raw {
        Count::Number(n) => *n,
        Count::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid(field))?,
    };
    i32::try_from(value)
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| invalid(field))
}

/// Parses a JSON array sent as a form field; the array must not be empty.
pub fn parse_list<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> Result<Vec<T>, AppError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("[]");
    let items: Vec<T> = serde_json::from_str(raw).map_err(|_| invalid(field))?;
    if items.is_empty() {
        return Err(invalid(field));
    }
    Ok(items)
}

fn check_ingredients(items: Vec<Ingredient>) -> Result<Vec<Ingredient>, AppError> {
    if items.is_empty() || items.iter().any(|i| i.name.trim().is_empty()) {
        return Err(invalid("ingredients"));
    }
    Ok(items)
}

fn check_steps(items: Vec<Step>) -> Result<Vec<Step>, AppError> {
    if items.is_empty() || items.iter().any(|s| s.step.trim().is_empty()) {
        return Err(invalid("steps"));
    }
    Ok(items)
}

/// Validates the multipart form. The returned recipe has no image yet; the
/// upload, if any, is handed back for storage.
pub fn validate_form(form: RecipeForm) -> Result<(NewRecipe, Option<UploadedFile>), AppError> {
    let title = non_blank("title", form.title)?;
    let category = non_blank("category", form.category)?;
    let prep_time = parse_count("prepTime", &Count::Text(form.prep_time.unwrap_or_default()))?;
    let servings = parse_count("servings", &Count::Text(form.servings.unwrap_or_default()))?;
    let ingredients = check_ingredients(parse_list("ingredients", form.ingredients.as_deref())?)?;
    let steps = check_steps(parse_list("steps", form.steps.as_deref())?)?;

    let recipe = NewRecipe {
        title,
        category,
        prep_time,
        servings,
        description: form.description.filter(|d| !d.trim().is_empty()),
        image: String::new(),
        ingredients,
        steps,
    };
    let file = form.file.filter(|f| !f.body.is_empty());
    Ok((recipe, file))
}

/// Validates only the fields present in the update body.
pub fn validate_changes(req: UpdateRecipeRequest) -> Result<RecipeChanges, AppError> {
    Ok(RecipeChanges {
        title: req.title.map(|t| non_blank("title", Some(t))).transpose()?,
        category: req.category.map(|c| non_blank("category", Some(c))).transpose()?,
        prep_time: req.prep_time.as_ref().map(|c| parse_count("prepTime", c)).transpose()?,
        servings: req.servings.as_ref().map(|c| parse_count("servings", c)).transpose()?,
        description: req
            .description
            .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty())),
        ingredients: req.ingredients.map(check_ingredients).transpose()?,
        steps: req.steps.map(check_steps).transpose()?,
    })
}

/// Empty query parameters count as absent.
pub fn parse_filter(query: RecipeQuery) -> Result<RecipeFilter, AppError> {
    let category = query.category.filter(|c| !c.is_empty());
    let author_id = match query.user_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| invalid("userId"))?),
    };
    Ok(RecipeFilter {
        category,
        author_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn form() -> RecipeForm {
        RecipeForm {
            title: Some("Syrniki".into()),
            category: Some("Desserts".into()),
            description: Some("Cottage cheese pancakes".into()),
            prep_time: Some("25".into()),
            servings: Some(" 4 ".into()),
            ingredients: Some(r#"[{"name":"cottage cheese","quantity":"400 g"},{"name":"egg"}]"#.into()),
            steps: Some(r#"[{"step":"Mix"},{"step":"Fry"}]"#.into()),
            file: None,
        }
    }

    #[test]
    fn valid_form_parses_numbers_and_lists() {
        let (recipe, file) = validate_form(form()).unwrap();
        assert_eq!(recipe.prep_time, 25);
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[1].quantity, "");
        assert_eq!(recipe.steps[1].step, "Fry");
        assert_eq!(recipe.image, "");
        assert!(file.is_none());
    }

    #[test]
    fn non_numeric_prep_time_is_rejected() {
        let bad = RecipeForm { prep_time: Some("abc".into()), ..form() };
        let err = validate_form(bad).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("prepTime"));
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let cases = [
            RecipeForm { title: None, ..form() },
            RecipeForm { category: Some("  ".into()), ..form() },
            RecipeForm { servings: None, ..form() },
            RecipeForm { prep_time: Some("-5".into()), ..form() },
            RecipeForm { ingredients: Some("[]".into()), ..form() },
            RecipeForm { ingredients: None, ..form() },
            RecipeForm { steps: Some("not json".into()), ..form() },
            RecipeForm { steps: Some(r#"[{"step":"  "}]"#.into()), ..form() },
        ];
        for case in cases {
            assert!(matches!(validate_form(case), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn empty_upload_is_ignored() {
        let with_empty = RecipeForm {
            file: Some(UploadedFile {
                file_name: Some("x.png".into()),
                content_type: Some("image/png".into()),
                body: Bytes::new(),
            }),
            ..form()
        };
        assert!(validate_form(with_empty).unwrap().1.is_none());
    }

    #[test]
    fn counts_accept_numbers_and_numeric_strings() {
        assert_eq!(parse_count("servings", &Count::Number(3)).unwrap(), 3);
        assert_eq!(parse_count("servings", &Count::Text("12".into())).unwrap(), 12);
        assert!(parse_count("servings", &Count::Text("12abc".into())).is_err());
        assert!(parse_count("servings", &Count::Number(i64::MAX)).is_err());
    }

    #[test]
    fn changes_keep_absent_fields_untouched() {
        let req: UpdateRecipeRequest =
            serde_json::from_str(r#"{"title":" Borscht ","prepTime":"90","servings":6}"#).unwrap();
        let changes = validate_changes(req).unwrap();
        assert_eq!(
            changes,
            RecipeChanges {
                title: Some("Borscht".into()),
                prep_time: Some(90),
                servings: Some(6),
                ..RecipeChanges::default()
            }
        );
    }

    #[test]
    fn changes_reject_invalid_present_fields() {
        let blank: UpdateRecipeRequest = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(validate_changes(blank).is_err());

        let empty_steps: UpdateRecipeRequest = serde_json::from_str(r#"{"steps":[]}"#).unwrap();
        assert!(validate_changes(empty_steps).is_err());
    }

    #[test]
    fn blank_description_clears_it() {
        let blank: UpdateRecipeRequest = serde_json::from_str(r#"{"description":"  "}"#).unwrap();
        assert_eq!(validate_changes(blank).unwrap().description, Some(None));

        let set: UpdateRecipeRequest = serde_json::from_str(r#"{"description":" Rich "}"#).unwrap();
        assert_eq!(validate_changes(set).unwrap().description, Some(Some("Rich".into())));

        let absent: UpdateRecipeRequest = serde_json::from_str(r#"{"title":"Soup"}"#).unwrap();
        assert_eq!(validate_changes(absent).unwrap().description, None);
    }

    #[test]
    fn filter_matches_category_verbatim() {
        let filter = parse_filter(RecipeQuery {
            category: Some("Desserts".into()),
            user_id: Some(String::new()),
        })
        .unwrap();
        assert_eq!(filter.category.as_deref(), Some("Desserts"));
        assert!(filter.author_id.is_none());

        let lower = parse_filter(RecipeQuery { category: Some("desserts".into()), user_id: None }).unwrap();
        assert_eq!(lower.category.as_deref(), Some("desserts"));
    }

    #[test]
    fn filter_parses_or_rejects_user_id() {
        let id = Uuid::new_v4();
        let filter = parse_filter(RecipeQuery { category: None, user_id: Some(id.to_string()) }).unwrap();
        assert_eq!(filter.author_id, Some(id));

        let err = parse_filter(RecipeQuery { category: None, user_id: Some("42".into()) }).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
