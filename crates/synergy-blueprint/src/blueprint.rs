//! Blueprint record returned to clients.

use crate::analysis::ImageAnalysis;
use crate::error::{Error, Result};
use crate::layout::{GridLayout, Palette};
use crate::parser::{estimate_square_feet, parse_description, ParsedDescription, Style};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated blueprint.
///
/// Created in one go and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    /// `bp_{unix_millis}_{hash prefix}`
    pub id: String,
    pub name: String,
    pub description: String,
    pub rooms: u32,
    pub square_feet: u32,
    pub style: Style,
    pub created_at: DateTime<Utc>,
    /// Rendered floor plan (SVG document)
    pub svg_data: String,
}

impl Blueprint {
    /// Parse `description` and render its floor plan.
    pub fn from_description(name: &str, description: &str) -> Result<Self> {
        require_fields(name, description)?;
        let parsed = parse_description(description)?;
        Self::from_parsed(name, description, &parsed, Utc::now())
    }

    /// Build from an already-parsed description.
    pub fn from_parsed(
        name: &str,
        description: &str,
        parsed: &ParsedDescription,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        require_fields(name, description)?;
        let layout = GridLayout::new(parsed.rooms)?;

        Ok(Self {
            id: Self::generate_id(name, description, created_at, rand::random()),
            name: name.to_string(),
            description: description.to_string(),
            rooms: parsed.rooms,
            square_feet: parsed.square_feet,
            style: parsed.style,
            created_at,
            svg_data: layout.to_svg(&Palette::DESCRIPTION),
        })
    }

    /// Build from an image analysis, using the image palette.
    pub fn from_image(name: &str, analysis: &ImageAnalysis, created_at: DateTime<Utc>) -> Result<Self> {
        require_fields(name, &analysis.description)?;
        let layout = GridLayout::new(analysis.rooms)?;

        Ok(Self {
            id: Self::generate_id(name, &analysis.description, created_at, rand::random()),
            name: name.to_string(),
            description: analysis.description.clone(),
            rooms: analysis.rooms,
            square_feet: estimate_square_feet(analysis.rooms),
            style: analysis.style,
            created_at,
            svg_data: layout.to_svg(&Palette::IMAGE),
        })
    }

    /// Generate an ID from the creation time and a hash of the content and
    /// `nonce`. Callers pass a random nonce so identical requests made in the
    /// same millisecond still get distinct IDs.
    pub fn generate_id(name: &str, description: &str, created_at: DateTime<Utc>, nonce: u64) -> String {
        let millis = created_at.timestamp_millis();
        let content = format!("{name}:{description}:{millis}:{nonce}");
        let hash = hex::encode(blake3::hash(content.as_bytes()).as_bytes());
        format!("bp_{}_{}", millis, &hash[..9])
    }
}

fn require_fields(name: &str, description: &str) -> Result<()> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(Error::invalid("Missing required fields"));
    }
    Ok(())
}
