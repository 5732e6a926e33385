//! Design parameters derived from an uploaded floor-plan image.
//!
//! There is no vision model behind this: the image bytes seed a generator
//! that picks a plausible room count and style. The same image always
//! produces the same analysis.

use crate::error::{Error, Result};
use crate::parser::Style;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Description attached to every image-derived blueprint.
pub const IMAGE_DESCRIPTION: &str =
    "Modern floor plan design with open-concept layout, multiple rooms, and natural light.";

/// Styles an image analysis can report.
pub const IMAGE_STYLES: [Style; 4] = [
    Style::Modern,
    Style::Contemporary,
    Style::Traditional,
    Style::Minimalist,
];

/// Room counts an image analysis can report (inclusive).
const IMAGE_ROOMS: std::ops::RangeInclusive<u32> = 3..=6;

/// Result of analyzing an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAnalysis {
    pub description: String,
    pub rooms: u32,
    pub style: Style,
}

/// Analyze an uploaded image.
///
/// `content_type` must be an `image/*` MIME type and `bytes` must be non-empty.
pub fn analyze_image(file_name: &str, content_type: &str, bytes: &[u8]) -> Result<ImageAnalysis> {
    if !content_type.starts_with("image/") {
        return Err(Error::invalid("File must be an image"));
    }
    if bytes.is_empty() {
        return Err(Error::invalid(format!("{file_name} is empty")));
    }

    let mut rng = StdRng::from_seed(*blake3::hash(bytes).as_bytes());
    let rooms = rng.gen_range(IMAGE_ROOMS);
    let style = IMAGE_STYLES[rng.gen_range(0..IMAGE_STYLES.len())];

    Ok(ImageAnalysis {
        description: IMAGE_DESCRIPTION.to_string(),
        rooms,
        style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_images() {
        let err = analyze_image("plan.pdf", "application/pdf", b"%PDF").unwrap_err();
        assert_eq!(err, Error::InvalidInput("File must be an image".into()));
    }

    #[test]
    fn rejects_empty_upload() {
        assert!(analyze_image("plan.png", "image/png", &[]).is_err());
    }

    #[test]
    fn same_image_same_analysis() {
        let bytes = b"\x89PNG\r\n\x1a\n fake image payload";
        let a = analyze_image("a.png", "image/png", bytes).unwrap();
        let b = analyze_image("b.png", "image/png", bytes).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.description, IMAGE_DESCRIPTION);
    }

    #[test]
    fn analysis_stays_in_range() {
        for i in 0u32..64 {
            let analysis = analyze_image("x.jpg", "image/jpeg", &i.to_le_bytes()).unwrap();
            assert!(IMAGE_ROOMS.contains(&analysis.rooms));
            assert!(IMAGE_STYLES.contains(&analysis.style));
        }
    }
}
