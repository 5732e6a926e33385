//! Real-estate market estimates for generated blueprints.
//!
//! Comparable listings come from a mock MLS feed driven by an injected RNG;
//! the estimate and recommendation rules are deterministic.

use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Value added per bedroom on top of the floor-area price.
pub const BEDROOM_BONUS: f64 = 20_000.0;

/// Comparables returned per query by the mock feed.
pub const COMPARABLES_PER_QUERY: usize = 5;

const STREETS: [&str; 4] = ["Oak", "Elm", "Maple", "Pine"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Sold,
    Listed,
    Pending,
}

/// A comparable property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparable {
    pub address: String,
    pub price: u64,
    pub price_per_sq_ft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub square_feet: u32,
    pub days_on_market: u32,
    /// Days between the sale and the query
    pub sold_days_ago: u32,
    pub status: ListingStatus,
}

/// Aggregate view of a local market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub average_price: f64,
    pub median_price: u64,
    pub average_price_per_sq_ft: f64,
    pub comparables: Vec<Comparable>,
    pub market_trend: MarketTrend,
    pub inventory_months: f64,
}

impl MarketData {
    /// Aggregate a set of comparables. The median is the upper middle
    /// element for even-sized sets.
    pub fn from_comparables(
        comparables: Vec<Comparable>,
        market_trend: MarketTrend,
        inventory_months: f64,
    ) -> Result<Self> {
        if comparables.is_empty() {
            return Err(Error::InvalidInput("market data needs at least one comparable".into()));
        }
        if !inventory_months.is_finite() || inventory_months < 0.0 {
            return Err(Error::InvalidInput(format!(
                "inventory months must be a non-negative number, got {inventory_months}"
            )));
        }
        if comparables.iter().any(|c| !c.price_per_sq_ft.is_finite()) {
            return Err(Error::InvalidInput("comparable price per square foot must be finite".into()));
        }
        Ok(Self::aggregate(comparables, market_trend, inventory_months))
    }

    fn aggregate(comparables: Vec<Comparable>, market_trend: MarketTrend, inventory_months: f64) -> Self {
        let mut prices: Vec<u64> = comparables.iter().map(|c| c.price).collect();
        prices.sort_unstable();

        let count = comparables.len() as f64;
        let average_price = prices.iter().map(|&p| p as f64).sum::<f64>() / count;
        let average_price_per_sq_ft = comparables.iter().map(|c| c.price_per_sq_ft).sum::<f64>() / count;

        Self {
            average_price,
            median_price: prices[prices.len() / 2],
            average_price_per_sq_ft,
            comparables,
            market_trend,
            inventory_months,
        }
    }
}

/// Mock MLS comparables for a property of the given size.
pub fn generate_comparables<R: Rng>(square_feet: u32, bedrooms: u32, rng: &mut R) -> Vec<Comparable> {
    let base_price_per_sq_ft = 150.0 + rng.gen::<f64>() * 100.0;

    (0..COMPARABLES_PER_QUERY)
        .map(|_| {
            let street = STREETS[rng.gen_range(0..STREETS.len())];
            Comparable {
                address: format!("{} {} Street", rng.gen_range(0..10_000), street),
                price: 300_000 + rng.gen_range(0..200_000),
                price_per_sq_ft: base_price_per_sq_ft + (rng.gen::<f64>() - 0.5) * 30.0,
                bedrooms,
                bathrooms: bedrooms / 2 + 1,
                square_feet: (f64::from(square_feet) * (0.9 + rng.gen::<f64>() * 0.2)) as u32,
                days_on_market: rng.gen_range(0..180),
                sold_days_ago: rng.gen_range(0..90),
                status: match rng.gen_range(0..3) {
                    0 => ListingStatus::Sold,
                    1 => ListingStatus::Listed,
                    _ => ListingStatus::Pending,
                },
            }
        })
        .collect()
}

/// Mock market snapshot for a typical 2000 sq ft, 4 bedroom home.
pub fn generate_market_data<R: Rng>(rng: &mut R) -> MarketData {
    let comparables = generate_comparables(2000, 4, rng);
    let trend = match rng.gen_range(0..3) {
        0 => MarketTrend::Up,
        1 => MarketTrend::Down,
        _ => MarketTrend::Stable,
    };
    let inventory_months = rng.gen::<f64>() * 6.0 + 2.0;

    MarketData::aggregate(comparables, trend, inventory_months)
}

/// `round(square_feet × price_per_sq_ft + bedrooms × 20000)`.
pub fn calculate_estimated_value(square_feet: u32, bedrooms: u32, price_per_sq_ft: f64) -> Result<u64> {
    if !price_per_sq_ft.is_finite() || price_per_sq_ft < 0.0 {
        return Err(Error::InvalidInput(format!(
            "price per square foot must be a non-negative number, got {price_per_sq_ft}"
        )));
    }
    let base = f64::from(square_feet) * price_per_sq_ft;
    let bonus = f64::from(bedrooms) * BEDROOM_BONUS;
    Ok((base + bonus).round() as u64)
}

/// The blueprint attributes recommendations look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyProfile {
    pub rooms: u32,
    pub square_feet: u32,
    pub style: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HousingRecommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub benefit: &'static str,
    pub priority: Priority,
}

/// Recommendations for a profile in the given market, in rule order.
pub fn generate_housing_recommendations(
    profile: &PropertyProfile,
    market: &MarketData,
) -> Vec<HousingRecommendation> {
    let mut recommendations = Vec::new();

    if market.market_trend == MarketTrend::Up {
        recommendations.push(HousingRecommendation {
            title: "Strong Seller's Market",
            description: "The current market shows upward trends. This is a good time to build or invest.",
            benefit: "Potential for appreciation",
            priority: Priority::High,
        });
    }

    if profile.square_feet < 1500 {
        recommendations.push(HousingRecommendation {
            title: "Consider Expansion",
            description: "Your blueprint is on the smaller side. Expanding 10-15% could increase resale value.",
            benefit: "Better market appeal",
            priority: Priority::Medium,
        });
    }

    if profile.rooms < 3 {
        recommendations.push(HousingRecommendation {
            title: "Add Guest Room",
            description: "Adding one more bedroom is highly marketable in current market conditions.",
            benefit: "5-8% value increase",
            priority: Priority::Medium,
        });
    }

    if profile.style == "Modern" {
        recommendations.push(HousingRecommendation {
            title: "Energy Efficiency Focus",
            description: "Modern homes sell better with emphasis on energy-efficient features.",
            benefit: "Premium pricing opportunity",
            priority: Priority::High,
        });
    }

    if market.inventory_months < 3.0 {
        recommendations.push(HousingRecommendation {
            title: "High Demand Area",
            description: "Low inventory in this market means quick sales potential.",
            benefit: "Faster sale timeline",
            priority: Priority::High,
        });
    }

    recommendations
}
