use anyhow::Context;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Writes an uploaded image and returns the generated file name it is
/// stored and served under.
pub async fn save_image(
    st: &AppState,
    original_name: Option<&str>,
    content_type: Option<&str>,
    body: bytes::Bytes,
) -> anyhow::Result<String> {
    anyhow::ensure!(!body.is_empty(), "empty upload");

    let name = object_name(original_name, content_type);
    let size = body.len();
    st.storage
        .put_object(&name, body)
        .await
        .with_context(|| format!("put_object {}", name))?;
    debug!(%name, size, "image stored");
    Ok(name)
}

/// `<uuid>.<ext>`, the extension taken from the client's file name when it
/// names an image type, else from the MIME type, else `bin`.
fn object_name(original_name: Option<&str>, content_type: Option<&str>) -> String {
    let ext = original_name
        .and_then(ext_from_file_name)
        .or_else(|| content_type.and_then(ext_from_mime))
        .unwrap_or("bin");
    format!("{}.{}", Uuid::new_v4(), ext)
}

fn ext_from_file_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "heic" => Some("heic"),
        _ => None,
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(super::ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/png"), Some("png"));
        assert_eq!(super::ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(super::ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_ext_from_file_name() {
        assert_eq!(super::ext_from_file_name("Cake.JPG"), Some("jpg"));
        assert_eq!(super::ext_from_file_name("cake.jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_file_name("no_extension"), None);
        assert_eq!(super::ext_from_file_name("weird.p/ng"), None);
        assert_eq!(super::ext_from_file_name("page.html"), None);
        assert_eq!(super::ext_from_file_name("logo.svg"), None);
    }

    #[test]
    fn test_object_name_ignores_non_image_extensions() {
        assert!(super::object_name(Some("x.html"), Some("image/png")).ends_with(".png"));
        assert!(super::object_name(Some("x.svg"), None).ends_with(".bin"));
        assert!(super::object_name(Some("x.js"), Some("text/javascript")).ends_with(".bin"));
    }

    #[test]
    fn test_object_name_is_unique_and_keeps_extension() {
        let a = super::object_name(Some("pie.png"), Some("image/jpeg"));
        let b = super::object_name(Some("pie.png"), Some("image/jpeg"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);

        assert!(super::object_name(None, Some("image/webp")).ends_with(".webp"));
        assert!(super::object_name(None, None).ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_save_image_rejects_empty_body() {
        let state = AppState::fake();
        assert!(super::save_image(&state, Some("a.png"), None, bytes::Bytes::new())
            .await
            .is_err());

        let name = super::save_image(&state, Some("a.png"), None, bytes::Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(name.ends_with(".png"));
    }
}
