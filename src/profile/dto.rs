use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub phone: String,
    /// `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub age: Option<i32>,
    pub recipes_count: i64,
    pub categories_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    pub birth_date: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}
