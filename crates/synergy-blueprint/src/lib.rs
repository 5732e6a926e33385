//! Synergy Blueprint
//!
//! Placeholder floor plans generated from free-text descriptions or uploaded
//! images.
//!
//! # Pipeline
//!
//! - **Parser**: pulls a bedroom count and a style out of a description
//! - **Analysis**: derives rooms and style from an uploaded image
//! - **Layout**: arranges rooms on a square-ish grid and renders SVG markup
//! - **Blueprint**: the JSON-facing record tying the pieces together
//!
//! Everything here is a pure function over small inputs. Nothing is cached
//! and nothing is persisted.
//!
//! # Example
//!
//! ```
//! use synergy_blueprint::{generate_floor_plan_svg, parse_description, Style};
//!
//! let parsed = parse_description("A 4-bedroom modern home").unwrap();
//! assert_eq!(parsed.rooms, 4);
//! assert_eq!(parsed.style, Style::Modern);
//! assert_eq!(parsed.square_feet, 1600);
//!
//! let svg = generate_floor_plan_svg(parsed.rooms).unwrap();
//! assert_eq!(svg.matches("<rect").count(), 4);
//! ```

mod analysis;
mod blueprint;
mod error;
mod layout;
mod parser;

pub use analysis::{analyze_image, ImageAnalysis, IMAGE_DESCRIPTION, IMAGE_STYLES};
pub use blueprint::Blueprint;
pub use error::{Error, Result};
pub use layout::{
    check_room_count, generate_floor_plan_svg, grid_dimensions, GridLayout, Palette, RoomCell, ROOM_NAMES,
};
pub use parser::{
    detect_style, estimate_square_feet, extract_rooms, parse_description,
    parse_description_with_rng, ParsedDescription, Style,
};

/// Width of every room rectangle, in SVG user units.
pub const ROOM_WIDTH: u32 = 150;

/// Height of every room rectangle, in SVG user units.
pub const ROOM_HEIGHT: u32 = 150;

/// Gap between neighbouring rooms.
pub const ROOM_SPACING: u32 = 20;

/// Offset of the first room from the canvas edge.
pub const CANVAS_MARGIN: u32 = 10;

/// Bedroom count assumed when a description does not mention one.
pub const DEFAULT_ROOMS: u32 = 4;

/// Smallest square footage ever estimated.
pub const MIN_SQUARE_FEET: u32 = 800;

/// Square feet attributed to each room.
pub const SQUARE_FEET_PER_ROOM: u32 = 400;

// Rooms must be square and the margin must fit inside one spacing gap
/// Largest room count a layout will allocate.
pub const MAX_ROOMS: u32 = 10_000;

const _: () = assert!(ROOM_WIDTH == ROOM_HEIGHT);
const _: () = assert!(2 * CANVAS_MARGIN <= ROOM_SPACING);
const _: () = assert!(MAX_ROOMS as u64 * SQUARE_FEET_PER_ROOM as u64 <= u32::MAX as u64);
