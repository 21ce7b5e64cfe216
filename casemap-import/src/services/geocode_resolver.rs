//! Tiered coordinate resolution
//!
//! Resolution order, first success wins:
//! 1. Explicit latitude/longitude text (no network)
//! 2. address, city, region, country
//! 3. address, city, country
//! 4. neighborhood, city, region, country
//! 5. neighborhood, city, country
//! 6. city, region, country
//! 7. city, country
//! 8. city
//!
//! Online tiers are described by `ONLINE_TIERS` and evaluated tier-major:
//! every candidate combination of a tier is tried before the next, coarser
//! tier. Each request passes through the shared `RequestGate`. Transport
//! faults are recorded and the cascade continues.

use std::collections::HashSet;
use std::sync::Arc;

use casemap_common::config::GeocodingConfig;
use tracing::{debug, warn};

use super::coordinate_parser::parse_coordinate;
use super::request_gate::RequestGate;
use crate::models::{
    AttemptResult, Resolution, ResolutionOutcome, ResolutionTier, ResolvedCoordinate, TierAttempt,
};
use crate::types::Geocoder;

/// Candidate location text for one row
///
/// Several source columns can hold the same concept, so each field is an
/// ordered list of fallbacks. Blank entries are ignored.
#[derive(Debug, Clone, Default)]
pub struct LocationCandidates {
    pub cities: Vec<String>,
    pub neighborhoods: Vec<String>,
    pub addresses: Vec<String>,
    pub latitudes: Vec<String>,
    pub longitudes: Vec<String>,
}

/// Fixed query context shared by every row
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub region: String,
    pub country: String,
    /// When false only explicit coordinates resolve
    pub online: bool,
}

impl ResolverSettings {
    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self {
            region: config.region.clone(),
            country: config.country.clone(),
            online: config.enabled,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Place {
    Address,
    Neighborhood,
    CityOnly,
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Omit,
    IfPresent,
    /// Tier is skipped when the part is blank
    Required,
}

#[derive(Debug, Clone, Copy)]
struct TierSpec {
    tier: ResolutionTier,
    place: Place,
    region: Part,
    country: Part,
}

const ONLINE_TIERS: [TierSpec; 7] = [
    TierSpec {
        tier: ResolutionTier::AddressCityRegion,
        place: Place::Address,
        region: Part::Required,
        country: Part::IfPresent,
    },
    TierSpec {
        tier: ResolutionTier::AddressCity,
        place: Place::Address,
        region: Part::Omit,
        country: Part::IfPresent,
    },
    TierSpec {
        tier: ResolutionTier::NeighborhoodCityRegion,
        place: Place::Neighborhood,
        region: Part::Required,
        country: Part::IfPresent,
    },
    TierSpec {
        tier: ResolutionTier::NeighborhoodCity,
        place: Place::Neighborhood,
        region: Part::Omit,
        country: Part::IfPresent,
    },
    TierSpec {
        tier: ResolutionTier::CityRegion,
        place: Place::CityOnly,
        region: Part::Required,
        country: Part::IfPresent,
    },
    TierSpec {
        tier: ResolutionTier::CityCountry,
        place: Place::CityOnly,
        region: Part::Omit,
        country: Part::Required,
    },
    TierSpec {
        tier: ResolutionTier::City,
        place: Place::CityOnly,
        region: Part::Omit,
        country: Part::Omit,
    },
];

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Append `value` according to `part`; false means the tier cannot run
fn push_part<'a>(parts: &mut Vec<&'a str>, part: Part, value: &'a str) -> bool {
    let value = value.trim();
    match part {
        Part::Omit => true,
        Part::IfPresent => {
            if !value.is_empty() {
                parts.push(value);
            }
            true
        }
        Part::Required => {
            if value.is_empty() {
                return false;
            }
            parts.push(value);
            true
        }
    }
}

impl TierSpec {
    /// Query strings for this tier, in candidate order
    fn queries(&self, candidates: &LocationCandidates, settings: &ResolverSettings) -> Vec<String> {
        let places: Vec<Option<&str>> = match self.place {
            Place::Address => non_blank(&candidates.addresses).map(Some).collect(),
            Place::Neighborhood => non_blank(&candidates.neighborhoods).map(Some).collect(),
            Place::CityOnly => vec![None],
        };

        let mut queries = Vec::new();
        for place in places.iter().copied() {
            for city in non_blank(&candidates.cities) {
                let mut parts: Vec<&str> = Vec::with_capacity(4);
                if let Some(place) = place {
                    parts.push(place);
                }
                parts.push(city);
                if !push_part(&mut parts, self.region, &settings.region)
                    || !push_part(&mut parts, self.country, &settings.country)
                {
                    continue;
                }
                queries.push(parts.join(", "));
            }
        }
        queries
    }
}

/// Resolves candidate location text to a tagged coordinate
pub struct GeocodeResolver {
    geocoder: Arc<dyn Geocoder>,
    gate: Arc<dyn RequestGate>,
    settings: ResolverSettings,
}

impl GeocodeResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        gate: Arc<dyn RequestGate>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            geocoder,
            gate,
            settings,
        }
    }

    /// Run the cascade
    ///
    /// Never fails: "nothing found" and transport faults are both reported
    /// through `Resolution::outcome`.
    pub async fn resolve(&self, candidates: &LocationCandidates) -> Resolution {
        if let Some(coordinate) = resolve_explicit(candidates) {
            debug!(
                latitude = %coordinate.latitude,
                longitude = %coordinate.longitude,
                "Using explicit coordinates"
            );
            return Resolution {
                outcome: ResolutionOutcome::Found(coordinate),
                attempts: Vec::new(),
            };
        }

        let mut attempts = Vec::new();
        if !self.settings.online {
            return Resolution {
                outcome: ResolutionOutcome::NotFound,
                attempts,
            };
        }

        let mut tried: HashSet<String> = HashSet::new();
        let mut last_fault: Option<String> = None;

        for tier_spec in &ONLINE_TIERS {
            for query in tier_spec.queries(candidates, &self.settings) {
                if !tried.insert(query.to_lowercase()) {
                    continue;
                }

                self.gate.acquire().await;

                match self.geocoder.search(&query).await {
                    Ok(Some(point)) => {
                        debug!(tier = %tier_spec.tier, query = %query, "Geocoding tier hit");
                        attempts.push(TierAttempt {
                            tier: tier_spec.tier,
                            query,
                            result: AttemptResult::Hit,
                        });
                        return Resolution {
                            outcome: ResolutionOutcome::Found(ResolvedCoordinate::new(
                                point.latitude,
                                point.longitude,
                                tier_spec.tier,
                            )),
                            attempts,
                        };
                    }
                    Ok(None) => {
                        debug!(tier = %tier_spec.tier, query = %query, "Geocoding tier miss");
                        attempts.push(TierAttempt {
                            tier: tier_spec.tier,
                            query,
                            result: AttemptResult::Miss,
                        });
                    }
                    Err(e) => {
                        warn!(tier = %tier_spec.tier, query = %query, error = %e, "Geocoding tier failed, trying next");
                        let detail = e.to_string();
                        attempts.push(TierAttempt {
                            tier: tier_spec.tier,
                            query,
                            result: AttemptResult::Fault(detail.clone()),
                        });
                        last_fault = Some(detail);
                    }
                }
            }
        }

        let outcome = match last_fault {
            Some(detail) => ResolutionOutcome::TransportFault(detail),
            None => ResolutionOutcome::NotFound,
        };

        Resolution { outcome, attempts }
    }
}

/// First latitude/longitude combination where both sides parse
fn resolve_explicit(candidates: &LocationCandidates) -> Option<ResolvedCoordinate> {
    let longitudes: Vec<_> = candidates
        .longitudes
        .iter()
        .filter_map(|text| parse_coordinate(text))
        .collect();
    let first_longitude = longitudes.first()?;

    candidates
        .latitudes
        .iter()
        .find_map(|text| parse_coordinate(text))
        .map(|latitude| {
            ResolvedCoordinate::new(latitude, first_longitude.clone(), ResolutionTier::Explicit)
        })
}
