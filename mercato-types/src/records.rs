//! Entities stored through the persistence gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MercatoError;
use crate::quote::AssetClass;

/// Named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// [`UserProfile`] records.
    Profiles,
    /// [`PortfolioRecommendation`] records.
    Recommendations,
    /// [`SavedPortfolio`] records.
    Portfolios,
}

impl Collection {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Recommendations => "recommendations",
            Self::Portfolios => "portfolios",
        }
    }
}

/// A stored entity plus its gateway-managed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    /// Generated identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Entity payload.
    pub data: T,
}

/// Investor risk appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    /// Capital preservation first.
    Conservative,
    /// Balanced.
    #[default]
    Moderate,
    /// Growth first.
    Aggressive,
}

/// Investment questionnaire answers for one user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Risk appetite.
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    /// Planned holding period.
    #[serde(default)]
    pub investment_horizon_years: u32,
    /// Free-form goals ("retirement", "house").
    #[serde(default)]
    pub goals: Vec<String>,
    /// Monthly amount the user plans to invest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<f64>,
}

/// One slice of a recommended allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Ticker.
    pub symbol: String,
    /// Asset class.
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Fraction of the portfolio in `[0, 1]`.
    pub weight: f64,
}

/// A portfolio suggestion derived from a profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRecommendation {
    /// Profile the recommendation was built for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
    /// Target allocations.
    pub allocations: Vec<Allocation>,
    /// Explanation shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// One position in a saved portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Ticker.
    pub symbol: String,
    /// Units held.
    pub quantity: f64,
    /// Average cost per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<f64>,
}

/// A user's saved portfolio.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPortfolio {
    /// Portfolio name.
    pub name: String,
    /// Positions.
    #[serde(default)]
    pub holdings: Vec<Holding>,
    /// Recommendation the portfolio was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_id: Option<Uuid>,
}

/// Entities that can check their own invariants before being stored.
pub trait Validate {
    /// # Errors
    /// Returns `InvalidArg` describing the first violated invariant.
    fn validate(&self) -> Result<(), MercatoError>;
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), MercatoError> {
        if self.monthly_budget.is_some_and(|b| !b.is_finite() || b < 0.0) {
            return Err(MercatoError::InvalidArg(
                "monthlyBudget must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

impl Validate for PortfolioRecommendation {
    fn validate(&self) -> Result<(), MercatoError> {
        let mut total = 0.0;
        for a in &self.allocations {
            if a.symbol.trim().is_empty() {
                return Err(MercatoError::InvalidArg("allocation without symbol".into()));
            }
            if !(0.0..=1.0).contains(&a.weight) {
                return Err(MercatoError::InvalidArg(format!(
                    "weight for {} must be within [0, 1]",
                    a.symbol
                )));
            }
            total += a.weight;
        }
        // small tolerance for float sums like 0.1 + 0.2 + 0.7
        if total > 1.0 + 1e-9 {
            return Err(MercatoError::InvalidArg(format!(
                "allocation weights sum to {total:.4}, expected at most 1"
            )));
        }
        Ok(())
    }
}

impl Validate for SavedPortfolio {
    fn validate(&self) -> Result<(), MercatoError> {
        if self.name.trim().is_empty() {
            return Err(MercatoError::InvalidArg("portfolio name is required".into()));
        }
        if let Some(h) = self
            .holdings
            .iter()
            .find(|h| h.symbol.trim().is_empty() || !h.quantity.is_finite() || h.quantity < 0.0)
        {
            return Err(MercatoError::InvalidArg(format!(
                "invalid holding '{}'",
                h.symbol
            )));
        }
        Ok(())
    }
}
