//! Rule-based extraction of design parameters from a free-text description.

use crate::error::{Error, Result};
use crate::layout::check_room_count;
use crate::{DEFAULT_ROOMS, MIN_SQUARE_FEET, SQUARE_FEET_PER_ROOM};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Architectural style attached to a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    Modern,
    Traditional,
    Contemporary,
    Rustic,
    Minimalist,
}

impl Style {
    /// Keywords recognized in descriptions, in priority order.
    pub const KEYWORDS: [(&'static str, Style); 3] = [
        ("modern", Style::Modern),
        ("rustic", Style::Rustic),
        ("contemporary", Style::Contemporary),
    ];

    /// Styles chosen from when no keyword matches.
    pub const FALLBACK: [Style; 5] = [
        Style::Modern,
        Style::Traditional,
        Style::Contemporary,
        Style::Rustic,
        Style::Minimalist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Modern => "Modern",
            Style::Traditional => "Traditional",
            Style::Contemporary => "Contemporary",
            Style::Rustic => "Rustic",
            Style::Minimalist => "Minimalist",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters extracted from a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDescription {
    pub rooms: u32,
    pub style: Style,
    pub square_feet: u32,
    /// Whether `style` came from a keyword rather than the fallback
    pub style_matched: bool,
}

// Compiled once on first use. The literal is exercised by `bedroom_pattern_compiles`.
fn bedroom_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([0-9]+)\s*-?bedroom").expect("bedroom pattern compiles"))
}

/// Bedroom count from the first `N bedroom` / `N-bedroom` mention.
///
/// Returns [`DEFAULT_ROOMS`] when there is no mention. A mentioned count
/// of zero or above [`MAX_ROOMS`](crate::MAX_ROOMS) is rejected.
pub fn extract_rooms(text: &str) -> Result<u32> {
    match bedroom_pattern().captures(text) {
        Some(caps) => {
            let digits = &caps[1];
            let rooms = digits
                .parse()
                .map_err(|_| Error::invalid(format!("bedroom count {digits} is out of range")))?;
            check_room_count(rooms)
        }
        None => Ok(DEFAULT_ROOMS),
    }
}

/// Style named by the first matching keyword, case-insensitively.
pub fn detect_style(text: &str) -> Option<Style> {
    let lower = text.to_lowercase();
    Style::KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, style)| *style)
}

/// `max(800, rooms * 400)`.
pub fn estimate_square_feet(rooms: u32) -> u32 {
    rooms.saturating_mul(SQUARE_FEET_PER_ROOM).max(MIN_SQUARE_FEET)
}

/// Parse a description.
///
/// When no style keyword is present, the fallback style is picked by hashing
/// the text, so the same description always yields the same result.
pub fn parse_description(text: &str) -> Result<ParsedDescription> {
    let hash = blake3::hash(text.as_bytes());
    let pick = hash.as_bytes()[0] as usize % Style::FALLBACK.len();
    parse_with_fallback(text, Style::FALLBACK[pick])
}

/// Parse a description, drawing the fallback style from `rng`.
pub fn parse_description_with_rng<R: Rng>(
    text: &str,
    rng: &mut R,
) -> Result<ParsedDescription> {
    let pick = rng.gen_range(0..Style::FALLBACK.len());
    parse_with_fallback(text, Style::FALLBACK[pick])
}

fn parse_with_fallback(text: &str, fallback: Style) -> Result<ParsedDescription> {
    let rooms = extract_rooms(text)?;
    let detected = detect_style(text);
    Ok(ParsedDescription {
        rooms,
        style: detected.unwrap_or(fallback),
        square_feet: estimate_square_feet(rooms),
        style_matched: detected.is_some(),
    })
}
