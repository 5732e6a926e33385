//! Grid layout and SVG rendering for floor plans.
//!
//! Rooms are placed row-major on a grid with `cols = ceil(sqrt(rooms))` and
//! `rows = ceil(rooms / cols)`. Every room is the same fixed-size rectangle,
//! so the grid always has at least as many cells as rooms and the last row
//! may be partially filled.

use crate::error::{Error, Result};
use crate::{CANVAS_MARGIN, MAX_ROOMS, ROOM_HEIGHT, ROOM_SPACING, ROOM_WIDTH};
use serde::Serialize;

/// Labels handed out to rooms in placement order.
///
/// Rooms past the end of this list are labeled `Room {n}` (1-based).
pub const ROOM_NAMES: [&str; 8] = [
    "Bedroom 1",
    "Bedroom 2",
    "Bedroom 3",
    "Kitchen",
    "Living Room",
    "Bathroom",
    "Garage",
    "Office",
];

/// Distance between the origins of two adjacent cells.
const CELL_PITCH: u32 = ROOM_WIDTH + ROOM_SPACING;

/// Colours used when rendering a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Room fill colour
    pub fill: &'static str,
    /// Room outline colour
    pub stroke: &'static str,
    /// Label colour; `None` leaves the SVG default
    pub label_fill: Option<&'static str>,
}

impl Palette {
    /// Grey plan used for text-derived blueprints.
    pub const DESCRIPTION: Self = Self {
        fill: "#f0f0f0",
        stroke: "#333",
        label_fill: None,
    };

    /// Blue plan used for image-derived blueprints.
    pub const IMAGE: Self = Self {
        fill: "#e8f4f8",
        stroke: "#2c5aa0",
        label_fill: Some("#333"),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::DESCRIPTION
    }
}

/// One placed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomCell {
    /// Zero-based placement order
    pub index: u32,
    pub row: u32,
    pub col: u32,
    /// Top-left corner
    pub x: u32,
    pub y: u32,
    pub label: String,
}

impl RoomCell {
    /// Centre of the rectangle, where the label is anchored.
    pub fn center(&self) -> (u32, u32) {
        (self.x + ROOM_WIDTH / 2, self.y + ROOM_HEIGHT / 2)
    }
}

/// Computed grid for a given room count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub cells: Vec<RoomCell>,
}

impl GridLayout {
    /// Lay out `rooms` rooms.
    ///
    /// One cell is allocated per room, so zero rooms and counts above
    /// [`MAX_ROOMS`] are rejected.
    pub fn new(rooms: u32) -> Result<Self> {
        let rooms = check_room_count(rooms)?;
        let (cols, rows) = grid_dimensions(rooms)?;

        let cells = (0..rooms)
            .map(|index| {
                let row = index / cols;
                let col = index % cols;
                RoomCell {
                    index,
                    row,
                    col,
                    x: col * CELL_PITCH + CANVAS_MARGIN,
                    y: row * CELL_PITCH + CANVAS_MARGIN,
                    label: room_label(index),
                }
            })
            .collect();

        Ok(Self { cols, rows, cells })
    }

    /// Number of rooms placed.
    pub fn room_count(&self) -> usize {
        self.cells.len()
    }

    /// Canvas size as `(width, height)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.cols * CELL_PITCH, self.rows * CELL_PITCH)
    }

    /// Render the layout as a standalone SVG document.
    pub fn to_svg(&self, palette: &Palette) -> String {
        let (width, height) = self.canvas_size();
        let mut svg = format!(
            r#"<svg viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
        );

        let label_fill = palette
            .label_fill
            .map(|fill| format!(r#" fill="{fill}""#))
            .unwrap_or_default();

        for cell in &self.cells {
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="2" />"#,
                cell.x, cell.y, ROOM_WIDTH, ROOM_HEIGHT, palette.fill, palette.stroke,
            ));

            let (cx, cy) = cell.center();
            svg.push_str(&format!(
                r#"<text x="{cx}" y="{cy}" text-anchor="middle" dy="0.3em" font-size="12" font-family="Arial"{label_fill}>{}</text>"#,
                escape_xml(&cell.label),
            ));
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Grid shape for `rooms` rooms as `(cols, rows)`.
///
/// `cols = ceil(sqrt(rooms))`, `rows = ceil(rooms / cols)`, so
/// `cols * rows >= rooms` always holds.
pub fn grid_dimensions(rooms: u32) -> Result<(u32, u32)> {
    if rooms == 0 {
        return Err(Error::invalid("room count must be at least 1"));
    }
    let cols = ceil_sqrt(rooms);
    let rows = rooms.div_ceil(cols);
    Ok((cols, rows))
}

/// Accept `rooms` if a layout can be built for it: at least 1 and at most
/// [`MAX_ROOMS`].
pub fn check_room_count(rooms: u32) -> Result<u32> {
    if rooms == 0 {
        return Err(Error::invalid("room count must be at least 1"));
    }
    if rooms > MAX_ROOMS {
        return Err(Error::invalid(format!("room count {rooms} exceeds the maximum of {MAX_ROOMS}")));
    }
    Ok(rooms)
}

/// Render the floor plan for `rooms` rooms using the default palette.
///
/// Same limits as [`GridLayout::new`].
pub fn generate_floor_plan_svg(rooms: u32) -> Result<String> {
    Ok(GridLayout::new(rooms)?.to_svg(&Palette::DESCRIPTION))
}

fn ceil_sqrt(n: u32) -> u32 {
    let n = u64::from(n);
    let mut root = (n as f64).sqrt() as u64;
    while root * root > n {
        root -= 1;
    }
    while root * root < n {
        root += 1;
    }
    root as u32
}

fn room_label(index: u32) -> String {
    ROOM_NAMES
        .get(index as usize)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("Room {}", index + 1))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
