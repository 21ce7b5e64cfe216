//! Resolved coordinates and resolution audit trail

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which step of the cascade produced a coordinate
///
/// Declared from most to least specific; the resolver tries online tiers in
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    /// Latitude/longitude supplied in the row itself
    Explicit,
    AddressCityRegion,
    AddressCity,
    NeighborhoodCityRegion,
    NeighborhoodCity,
    CityRegion,
    CityCountry,
    City,
}

/// Coarse confidence grouping of tiers
///
/// Ordered so that `Explicit > Address > Neighborhood > City`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    City,
    Neighborhood,
    Address,
    Explicit,
}

impl ResolutionTier {
    pub fn specificity(self) -> Specificity {
        match self {
            ResolutionTier::Explicit => Specificity::Explicit,
            ResolutionTier::AddressCityRegion | ResolutionTier::AddressCity => Specificity::Address,
            ResolutionTier::NeighborhoodCityRegion | ResolutionTier::NeighborhoodCity => {
                Specificity::Neighborhood
            }
            ResolutionTier::CityRegion | ResolutionTier::CityCountry | ResolutionTier::City => {
                Specificity::City
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionTier::Explicit => "explicit",
            ResolutionTier::AddressCityRegion => "address_city_region",
            ResolutionTier::AddressCity => "address_city",
            ResolutionTier::NeighborhoodCityRegion => "neighborhood_city_region",
            ResolutionTier::NeighborhoodCity => "neighborhood_city",
            ResolutionTier::CityRegion => "city_region",
            ResolutionTier::CityCountry => "city_country",
            ResolutionTier::City => "city",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latitude/longitude pair tagged with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCoordinate {
    pub latitude: BigDecimal,
    pub longitude: BigDecimal,
    pub tier: ResolutionTier,
}

impl ResolvedCoordinate {
    pub fn new(latitude: BigDecimal, longitude: BigDecimal, tier: ResolutionTier) -> Self {
        Self {
            latitude,
            longitude,
            tier,
        }
    }
}

/// Result of a single online query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum AttemptResult {
    Hit,
    Miss,
    /// Transport error, non-2xx status or malformed body
    Fault(String),
}

/// One online query issued while resolving a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub tier: ResolutionTier,
    pub query: String,
    pub result: AttemptResult,
}

/// Resolver verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Found(ResolvedCoordinate),
    /// Every tier answered and none had a result
    NotFound,
    /// Nothing found and at least one tier failed in transport; holds the
    /// last failure
    TransportFault(String),
}

/// Resolver output: verdict plus every online query that was tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub attempts: Vec<TierAttempt>,
}

impl Resolution {
    /// Collapse to the optional coordinate used for row mapping
    pub fn into_coordinate(self) -> Option<ResolvedCoordinate> {
        match self.outcome {
            ResolutionOutcome::Found(coordinate) => Some(coordinate),
            ResolutionOutcome::NotFound | ResolutionOutcome::TransportFault(_) => None,
        }
    }

    pub fn coordinate(&self) -> Option<&ResolvedCoordinate> {
        match &self.outcome {
            ResolutionOutcome::Found(coordinate) => Some(coordinate),
            _ => None,
        }
    }
}
