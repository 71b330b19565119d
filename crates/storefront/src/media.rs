//! Image reference resolution.

use tamarind_core::ImageRef;
use url::Url;

/// Shown when a record has no usable image reference.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.png";

/// Resolve an image reference to a displayable URL.
///
/// Absolute references pass through untouched; relative ones are joined to
/// `media_base`. Missing or blank references resolve to
/// [`PLACEHOLDER_IMAGE`]. Pure and infallible: a broken reference degrades
/// to the placeholder, never to an error.
#[must_use]
pub fn resolve_image(media_base: &Url, image: Option<&ImageRef>) -> String {
    let Some(image) = image else {
        return PLACEHOLDER_IMAGE.to_owned();
    };

    let raw = image.as_str().trim();
    if raw.is_empty() {
        return PLACEHOLDER_IMAGE.to_owned();
    }
    if image.is_absolute() {
        return raw.to_owned();
    }

    format!(
        "{}/{}",
        media_base.as_str().trim_end_matches('/'),
        raw.trim_start_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://media.example.com").unwrap()
    }

    #[test]
    fn missing_or_blank_reference_uses_placeholder() {
        assert_eq!(resolve_image(&base(), None), PLACEHOLDER_IMAGE);

        let blank = ImageRef::new("   ");
        assert_eq!(resolve_image(&base(), Some(&blank)), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn absolute_reference_passes_through() {
        let absolute = ImageRef::new("https://cdn.example.com/shoe.png");
        assert_eq!(
            resolve_image(&base(), Some(&absolute)),
            "https://cdn.example.com/shoe.png"
        );
    }

    #[test]
    fn relative_reference_joins_the_media_base() {
        let relative = ImageRef::new("uploads/shoe.png");
        assert_eq!(
            resolve_image(&base(), Some(&relative)),
            "https://media.example.com/uploads/shoe.png"
        );

        let leading_slash = ImageRef::new("/uploads/shoe.png");
        assert_eq!(
            resolve_image(&base(), Some(&leading_slash)),
            "https://media.example.com/uploads/shoe.png"
        );
    }
}
