//! Pi valuation by source type.
//!
//! Pi bought on a centralized exchange is worth its market price. Mined and
//! contributed Pi carry a premium multiplier:
//!
//! | source          | multiplier |
//! |-----------------|-----------:|
//! | `PURCHASED_CEX` | 1.0        |
//! | `CONTRIBUTED`   | 5.0        |
//! | `MINED`         | 10.0       |
//!
//! `total_value = amount × base_price × multiplier`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market price assumed when the caller gives none (USD per Pi).
pub const DEFAULT_BASE_PRICE: f64 = 1.0;

/// Where a Pi holding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Mined,
    PurchasedCex,
    Contributed,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [
        SourceType::PurchasedCex,
        SourceType::Mined,
        SourceType::Contributed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Mined => "MINED",
            SourceType::PurchasedCex => "PURCHASED_CEX",
            SourceType::Contributed => "CONTRIBUTED",
        }
    }

    /// Valuation rule for this source.
    pub fn rule(&self) -> &'static ValuationRule {
        match self {
            SourceType::PurchasedCex => &RULES[0],
            SourceType::Mined => &RULES[1],
            SourceType::Contributed => &RULES[2],
        }
    }

    pub fn premium_multiplier(&self) -> f64 {
        self.rule().premium_multiplier
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MINED" => Ok(SourceType::Mined),
            "PURCHASED_CEX" => Ok(SourceType::PurchasedCex),
            "CONTRIBUTED" => Ok(SourceType::Contributed),
            other => Err(Error::InvalidInput(format!("unknown source type: {other}"))),
        }
    }
}

/// Multiplier and wording for one source type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRule {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub premium_multiplier: f64,
    pub description: &'static str,
    pub notes: &'static str,
}

/// The valuation table, in `SourceType::ALL` order.
pub static RULES: [ValuationRule; 3] = [
    ValuationRule {
        source_type: SourceType::PurchasedCex,
        premium_multiplier: 1.0,
        description: "Purchased Pi from centralized exchanges (CEX) - valued at market price",
        notes: "Does not hold the same value as mined/contributed Pi",
    },
    ValuationRule {
        source_type: SourceType::Mined,
        premium_multiplier: 10.0,
        description: "Mined Pi through proof of work - holds premium value",
        notes: "Verified mining activity grants higher valuation",
    },
    ValuationRule {
        source_type: SourceType::Contributed,
        premium_multiplier: 5.0,
        description: "Contributed Pi through network participation - holds elevated value",
        notes: "Active network contribution grants premium valuation",
    },
];

/// Valuation of a Pi amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiValuation {
    pub amount: f64,
    pub source_type: SourceType,
    /// `amount × base_price`, in USD
    pub base_value: f64,
    pub premium_multiplier: f64,
    pub total_value: f64,
    pub description: String,
}

/// Value `amount` Pi of the given source at `base_price` USD.
pub fn calculate_pi_value(amount: f64, source_type: SourceType, base_price: f64) -> Result<PiValuation> {
    check_non_negative("amount", amount)?;
    check_non_negative("base price", base_price)?;
    let valuation = value_of(amount, source_type, base_price);
    check_finite_total(&valuation)?;
    Ok(valuation)
}

fn value_of(amount: f64, source_type: SourceType, base_price: f64) -> PiValuation {
    let rule = source_type.rule();
    let base_value = amount * base_price;

    PiValuation {
        amount,
        source_type,
        base_value,
        premium_multiplier: rule.premium_multiplier,
        total_value: base_value * rule.premium_multiplier,
        description: rule.description.to_string(),
    }
}

/// The same amount valued under every source type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationComparison {
    pub purchased: PiValuation,
    pub mined: PiValuation,
    pub contributed: PiValuation,
    pub summary: String,
}

pub fn compare_pi_valuations(amount: f64, base_price: f64) -> Result<ValuationComparison> {
    check_non_negative("amount", amount)?;
    check_non_negative("base price", base_price)?;
    let comparison = compare_checked(amount, base_price);
    // Mined carries the largest multiplier.
    check_finite_total(&comparison.mined)?;
    Ok(comparison)
}

fn compare_checked(amount: f64, base_price: f64) -> ValuationComparison {
    let purchased = value_of(amount, SourceType::PurchasedCex, base_price);
    let mined = value_of(amount, SourceType::Mined, base_price);
    let contributed = value_of(amount, SourceType::Contributed, base_price);

    let summary = format!(
        "For {} Pi: Purchased (CEX) = ${:.2} | Mined = ${:.2} ({}x) | Contributed = ${:.2} ({}x)",
        amount,
        purchased.total_value,
        mined.total_value,
        mined.premium_multiplier,
        contributed.total_value,
        contributed.premium_multiplier,
    );

    ValuationComparison {
        purchased,
        mined,
        contributed,
        summary,
    }
}

/// Outcome of checking a claimed source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVerification {
    pub verified: bool,
    /// Source type the holding is valued as (may differ from the claim)
    pub source_type: SourceType,
    pub message: &'static str,
    pub premium_multiplier: f64,
}

/// Check a claimed source against the evidence supplied.
///
/// Mined claims need a proof-of-work string and contributed claims need a
/// network-contribution string. Missing or empty evidence downgrades the
/// holding to exchange valuation.
pub fn verify_pi_source(
    claimed: SourceType,
    proof_of_work: Option<&str>,
    network_contribution: Option<&str>,
) -> SourceVerification {
    let present = |evidence: Option<&str>| evidence.is_some_and(|s| !s.is_empty());

    let (verified, source_type, message) = match claimed {
        SourceType::Mined if !present(proof_of_work) => (
            false,
            SourceType::PurchasedCex,
            "No proof of work provided - defaulting to CEX valuation",
        ),
        SourceType::Mined => (
            true,
            SourceType::Mined,
            "Proof of work verified - premium valuation granted",
        ),
        SourceType::Contributed if !present(network_contribution) => (
            false,
            SourceType::PurchasedCex,
            "No network contribution proof - defaulting to CEX valuation",
        ),
        SourceType::Contributed => (
            true,
            SourceType::Contributed,
            "Network contribution verified - elevated valuation granted",
        ),
        SourceType::PurchasedCex => (
            true,
            SourceType::PurchasedCex,
            "Exchange purchase verified - market valuation applied",
        ),
    };

    SourceVerification {
        verified,
        source_type,
        message,
        premium_multiplier: source_type.premium_multiplier(),
    }
}

/// Value a claimed holding after verifying its source.
pub fn calculate_verified_value(
    amount: f64,
    claimed: SourceType,
    base_price: f64,
    proof_of_work: Option<&str>,
    network_contribution: Option<&str>,
) -> Result<(SourceVerification, PiValuation)> {
    let verification = verify_pi_source(claimed, proof_of_work, network_contribution);
    let valuation = calculate_pi_value(amount, verification.source_type, base_price)?;
    Ok((verification, valuation))
}

/// Static facts about the valuation network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub enabled: bool,
    pub network_name: &'static str,
    pub valuation_system_version: &'static str,
    pub established_date: &'static str,
}

pub const NETWORK_STATUS: NetworkStatus = NetworkStatus {
    enabled: true,
    network_name: "TWIN_TOWER_NETWORK",
    valuation_system_version: "1.0",
    established_date: "2025-01-14",
};

/// Everything the valuation page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSummary {
    pub rules: [ValuationRule; 3],
    pub network_status: NetworkStatus,
    pub valuation_examples: ValuationComparison,
}

/// Rules, network status, and the 100 Pi at $1 example.
pub fn valuation_summary() -> ValuationSummary {
    ValuationSummary {
        rules: RULES,
        network_status: NETWORK_STATUS,
        valuation_examples: compare_checked(100.0, DEFAULT_BASE_PRICE),
    }
}

fn check_non_negative(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{what} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Finite inputs can still multiply past `f64::MAX`.
fn check_finite_total(valuation: &PiValuation) -> Result<()> {
    if !valuation.base_value.is_finite() || !valuation.total_value.is_finite() {
        return Err(Error::InvalidInput(format!(
            "valuation of {} Pi overflows",
            valuation.amount
        )));
    }
    Ok(())
}
