use serde::Deserialize;

/// Body of both create and rename.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}
