//! Synergy Valuation
//!
//! Two small calculators used by the dashboard:
//!
//! - **Pi**: values Pi holdings by where they came from (exchange purchase,
//!   mining, or network contribution)
//! - **Market**: estimates property value for a blueprint and suggests
//!   improvements given local market data
//!
//! # Example
//!
//! ```
//! use synergy_valuation::{calculate_pi_value, SourceType};
//!
//! let v = calculate_pi_value(100.0, SourceType::Mined, 1.0).unwrap();
//! assert_eq!(v.total_value, 1000.0);
//! ```

mod error;
pub mod market;
pub mod pi;

pub use error::{Error, Result};
pub use market::{
    calculate_estimated_value, generate_housing_recommendations, HousingRecommendation, MarketData,
    MarketTrend, PropertyProfile,
};
pub use pi::{
    calculate_pi_value, calculate_verified_value, compare_pi_valuations, valuation_summary,
    verify_pi_source, PiValuation, SourceType, SourceVerification, ValuationComparison,
    ValuationSummary, DEFAULT_BASE_PRICE,
};
