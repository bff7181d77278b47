use crate::error::AppError;

/// Category names are compared after trimming; blank names are rejected.
pub fn normalize_name(name: Option<String>) -> Result<String, AppError> {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("Category name is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_requires_a_name() {
        assert_eq!(normalize_name(Some("  Desserts ".into())).unwrap(), "Desserts");
        assert!(matches!(normalize_name(None), Err(AppError::Validation(_))));
        assert!(matches!(normalize_name(Some("   ".into())), Err(AppError::Validation(_))));
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(normalize_name(Some("desserts".into())).unwrap(), "desserts");
    }
}
