//! Company and category models.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A company listed in the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub name: String,
    pub domain: String,
    /// Display revenue, e.g. `$574.8B+` or `$850M+`
    pub revenue: String,
    /// Display headcount, e.g. `1.5M+`
    pub employees: String,
    pub description: String,
    #[serde(default)]
    pub pi_pay_enabled: bool,
}

impl Company {
    /// Annual revenue in billions of USD.
    pub fn revenue_billions(&self) -> Result<f64> {
        parse_revenue(&self.revenue)
    }

    /// Case-insensitive substring match on name or domain.
    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.domain.to_lowercase().contains(needle)
    }
}

/// A named group of companies. Order within the group is display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub companies: Vec<Company>,
}

/// Parse a display revenue string into billions of USD.
///
/// `$`, `+` and `,` are ignored; the amount must end in `B` (billions) or
/// `M` (millions).
pub fn parse_revenue(revenue: &str) -> Result<f64> {
    let cleaned: String = revenue
        .chars()
        .filter(|c| !matches!(c, '$' | '+' | ',') && !c.is_whitespace())
        .collect();

    let (number, per_billion) = if let Some(n) = cleaned.strip_suffix('B') {
        (n, 1.0)
    } else if let Some(n) = cleaned.strip_suffix('M') {
        (n, 1000.0)
    } else {
        return Err(Error::InvalidInput(format!("unrecognized revenue: {revenue:?}")));
    };

    let value: f64 = number
        .parse()
        .map_err(|_| Error::InvalidInput(format!("unrecognized revenue: {revenue:?}")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!("unrecognized revenue: {revenue:?}")));
    }
    Ok(value / per_billion)
}
