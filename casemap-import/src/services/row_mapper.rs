//! ImportRow → MappedCase
//!
//! Required fields are validated before any geocoding so rejected rows never
//! cost an outbound request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::geocode_resolver::{GeocodeResolver, LocationCandidates};
use crate::models::{ImportRow, MappedCase, ResolutionOutcome};
use crate::types::{ReferenceCatalog, ReferenceLookup};

/// Why a single row was rejected
///
/// Messages quote the offending text verbatim so operators can find it in
/// the source file.
#[derive(Debug, Error)]
pub enum RowMappingError {
    #[error("Invalid year '{0}': expected a whole number")]
    InvalidYear(String),

    #[error("Invalid age '{0}': expected a non-negative whole number")]
    InvalidAge(String),

    #[error("Missing classification")]
    MissingClassification,

    #[error("Unrecognized classification '{0}'")]
    UnknownClassification(String),

    #[error("Ambiguous classification '{text}': matches {}", .candidates.join(", "))]
    AmbiguousClassification {
        text: String,
        candidates: Vec<String>,
    },

    /// Catalog itself failed; the importer treats this as fatal
    #[error("Reference catalog error: {0}")]
    Catalog(#[from] casemap_common::Error),
}

/// Per-import context shared by every row
#[derive(Debug, Clone, Copy)]
pub struct MappingContext {
    pub workflow_state_id: i64,
    pub imported_by: Uuid,
    pub imported_at: DateTime<Utc>,
}

pub struct RowMapper {
    resolver: Arc<GeocodeResolver>,
    catalog: Arc<dyn ReferenceCatalog>,
    classification_category: String,
    default_city: String,
}

impl RowMapper {
    pub fn new(
        resolver: Arc<GeocodeResolver>,
        catalog: Arc<dyn ReferenceCatalog>,
        classification_category: impl Into<String>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            catalog,
            classification_category: classification_category.into(),
            default_city: default_city.into(),
        }
    }

    pub async fn map(
        &self,
        row: &ImportRow,
        row_number: usize,
        context: &MappingContext,
    ) -> Result<MappedCase, RowMappingError> {
        let year = parse_year(&row.year)?;
        let age = parse_age(&row.age)?;
        let classification_id = self.resolve_classification(&row.classification).await?;

        let neighborhood = row.neighborhood.trim().to_string();
        let address = if row.address.trim().is_empty() {
            neighborhood.clone()
        } else {
            row.address.trim().to_string()
        };

        let candidates = LocationCandidates {
            cities: vec![row.city.clone(), self.default_city.clone()],
            neighborhoods: vec![neighborhood.clone()],
            addresses: vec![address.clone()],
            latitudes: vec![row.latitude.clone()],
            longitudes: vec![row.longitude.clone()],
        };

        let resolution = self.resolver.resolve(&candidates).await;
        match &resolution.outcome {
            ResolutionOutcome::TransportFault(detail) => warn!(
                row = row_number,
                attempts = resolution.attempts.len(),
                detail = %detail,
                "Row imported without coordinates after geocoder faults"
            ),
            ResolutionOutcome::NotFound => debug!(
                row = row_number,
                attempts = resolution.attempts.len(),
                "No coordinates found for row"
            ),
            ResolutionOutcome::Found(_) => {}
        }

        let classification = row.classification.trim();
        let notes = match row.notes.trim() {
            "" => None,
            text => Some(text.to_string()),
        };

        Ok(MappedCase {
            row_number,
            classification_id,
            workflow_state_id: context.workflow_state_id,
            year,
            age,
            neighborhood,
            address,
            description: format!("Imported case: {}", classification),
            temporary_name: format!("Imported case {}-{}", year, row_number),
            notes,
            coordinate: resolution.into_coordinate(),
            imported_by: context.imported_by,
            imported_at: context.imported_at,
        })
    }

    async fn resolve_classification(&self, text: &str) -> Result<i64, RowMappingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RowMappingError::MissingClassification);
        }

        match self
            .catalog
            .find_active_by_fuzzy_name(&self.classification_category, text)
            .await?
        {
            ReferenceLookup::Found(id) => Ok(id),
            ReferenceLookup::NotFound => {
                Err(RowMappingError::UnknownClassification(text.to_string()))
            }
            ReferenceLookup::Ambiguous(candidates) => Err(RowMappingError::AmbiguousClassification {
                text: text.to_string(),
                candidates,
            }),
        }
    }
}

fn parse_year(text: &str) -> Result<i32, RowMappingError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| RowMappingError::InvalidYear(text.trim().to_string()))
}

fn parse_age(text: &str) -> Result<i32, RowMappingError> {
    match text.trim().parse::<i32>() {
        Ok(age) if age >= 0 => Ok(age),
        _ => Err(RowMappingError::InvalidAge(text.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::match_reference;
    use crate::models::ResolutionTier;
    use crate::services::geocode_resolver::ResolverSettings;
    use crate::services::request_gate::NoDelayGate;
    use crate::types::{GeoPoint, GeocodeError, Geocoder};
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCatalog {
        entries: Vec<(i64, String)>,
    }

    #[async_trait]
    impl ReferenceCatalog for FixedCatalog {
        async fn find_active_by_fuzzy_name(
            &self,
            _category: &str,
            text: &str,
        ) -> casemap_common::Result<ReferenceLookup> {
            Ok(match_reference(&self.entries, text))
        }

        async fn find_active_by_name(
            &self,
            _category: &str,
            name: &str,
        ) -> casemap_common::Result<Option<i64>> {
            Ok(self
                .entries
                .iter()
                .find(|(_, n)| n.eq_ignore_ascii_case(name))
                .map(|(id, _)| *id))
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl ReferenceCatalog for BrokenCatalog {
        async fn find_active_by_fuzzy_name(
            &self,
            _category: &str,
            _text: &str,
        ) -> casemap_common::Result<ReferenceLookup> {
            Err(casemap_common::Error::Internal("catalog offline".to_string()))
        }

        async fn find_active_by_name(
            &self,
            _category: &str,
            _name: &str,
        ) -> casemap_common::Result<Option<i64>> {
            Ok(None)
        }
    }

    /// Resolves the default city only; counts calls
    #[derive(Default)]
    struct CityOnlyGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for CityOnlyGeocoder {
        async fn search(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query == "Armenia" {
                return Ok(Some(GeoPoint {
                    latitude: BigDecimal::from_str("4.5339").unwrap(),
                    longitude: BigDecimal::from_str("-75.6811").unwrap(),
                }));
            }
            Ok(None)
        }
    }

    fn catalog() -> Arc<dyn ReferenceCatalog> {
        Arc::new(FixedCatalog {
            entries: vec![
                (1, "Dengue sin signos de alarma".to_string()),
                (2, "Dengue con signos de alarma".to_string()),
                (3, "Dengue grave".to_string()),
            ],
        })
    }

    /// Every search fails in transport
    struct UnreachableGeocoder;

    #[async_trait]
    impl Geocoder for UnreachableGeocoder {
        async fn search(&self, _query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            Err(GeocodeError::Network("connection refused".to_string()))
        }
    }

    fn mapper_with(catalog: Arc<dyn ReferenceCatalog>, geocoder: Arc<dyn Geocoder>) -> RowMapper {
        let resolver = GeocodeResolver::new(
            geocoder,
            Arc::new(NoDelayGate),
            ResolverSettings {
                region: "Quindío".to_string(),
                country: "Colombia".to_string(),
                online: true,
            },
        );
        RowMapper::new(
            Arc::new(resolver),
            catalog,
            "dengue_classification",
            "Armenia",
        )
    }

    fn context() -> MappingContext {
        MappingContext {
            workflow_state_id: 4,
            imported_by: Uuid::nil(),
            imported_at: Utc::now(),
        }
    }

    fn row(year: &str, age: &str, classification: &str) -> ImportRow {
        ImportRow {
            year: year.to_string(),
            age: age.to_string(),
            classification: classification.to_string(),
            neighborhood: "El Jardín".to_string(),
            latitude: "4.5389".to_string(),
            longitude: "-75.6821".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_maps_valid_row_with_explicit_coordinates() {
        let geocoder = Arc::new(CityOnlyGeocoder::default());
        let mapper = mapper_with(catalog(), geocoder.clone());

        let case = mapper
            .map(&row("2024", "30", "Dengue sin signos de alarma"), 2, &context())
            .await
            .unwrap();

        assert_eq!(case.year, 2024);
        assert_eq!(case.age, 30);
        assert_eq!(case.classification_id, 1);
        assert_eq!(case.workflow_state_id, 4);
        assert_eq!(case.address, "El Jardín");
        assert_eq!(case.description, "Imported case: Dengue sin signos de alarma");
        assert_eq!(case.temporary_name, "Imported case 2024-2");
        assert_eq!(case.notes, None);
        assert_eq!(
            case.coordinate.map(|c| c.tier),
            Some(ResolutionTier::Explicit)
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_year_quotes_text_and_skips_geocoding() {
        let geocoder = Arc::new(CityOnlyGeocoder::default());
        let mapper = mapper_with(catalog(), geocoder.clone());

        let mut input = row("abc", "30", "Dengue grave");
        input.latitude.clear();

        let err = mapper.map(&input, 3, &context()).await.unwrap_err();
        assert!(matches!(err, RowMappingError::InvalidYear(_)));
        assert!(err.to_string().contains("'abc'"));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_negative_or_fractional_age_rejected() {
        let mapper = mapper_with(catalog(), Arc::new(CityOnlyGeocoder::default()));

        for age in ["-1", "30.5", ""] {
            let err = mapper
                .map(&row("2024", age, "Dengue grave"), 2, &context())
                .await
                .unwrap_err();
            assert!(matches!(err, RowMappingError::InvalidAge(_)), "age {:?}", age);
        }
    }

    #[tokio::test]
    async fn test_unknown_classification_quotes_text() {
        let mapper = mapper_with(catalog(), Arc::new(CityOnlyGeocoder::default()));

        let err = mapper
            .map(&row("2024", "30", "Chikungunya"), 2, &context())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Chikungunya"));
    }

    #[tokio::test]
    async fn test_ambiguous_classification_lists_candidates() {
        let mapper = mapper_with(catalog(), Arc::new(CityOnlyGeocoder::default()));

        let err = mapper
            .map(&row("2024", "30", "signos de alarma"), 2, &context())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(matches!(err, RowMappingError::AmbiguousClassification { .. }));
        assert!(message.contains("Dengue sin signos de alarma"));
        assert!(message.contains("Dengue con signos de alarma"));
    }

    #[tokio::test]
    async fn test_blank_classification_is_missing() {
        let mapper = mapper_with(catalog(), Arc::new(CityOnlyGeocoder::default()));
        let err = mapper
            .map(&row("2024", "30", "   "), 2, &context())
            .await
            .unwrap_err();
        assert!(matches!(err, RowMappingError::MissingClassification));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_distinguishable() {
        let mapper = mapper_with(Arc::new(BrokenCatalog), Arc::new(CityOnlyGeocoder::default()));
        let err = mapper
            .map(&row("2024", "30", "Dengue grave"), 2, &context())
            .await
            .unwrap_err();
        assert!(matches!(err, RowMappingError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_default_city() {
        let geocoder = Arc::new(CityOnlyGeocoder::default());
        let mapper = mapper_with(catalog(), geocoder.clone());

        let mut input = row("2024", "30", "Dengue grave");
        input.latitude.clear();
        input.longitude.clear();
        input.notes = " traveled recently ".to_string();

        let case = mapper.map(&input, 5, &context()).await.unwrap();

        assert_eq!(case.coordinate.map(|c| c.tier), Some(ResolutionTier::City));
        assert_eq!(case.notes.as_deref(), Some("traveled recently"));
        assert!(geocoder.calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_address_column_wins_over_neighborhood() {
        let mapper = mapper_with(catalog(), Arc::new(CityOnlyGeocoder::default()));
        let mut input = row("2024", "30", "Dengue grave");
        input.address = "Calle 10 # 5-20".to_string();

        let case = mapper.map(&input, 2, &context()).await.unwrap();
        assert_eq!(case.address, "Calle 10 # 5-20");
        assert_eq!(case.neighborhood, "El Jardín");
    }

    #[tokio::test]
    async fn test_geocoder_faults_logged_at_warn() {
        let (logs, _guard) = crate::test_logs::capture_logs(tracing::Level::INFO);
        let mapper = mapper_with(catalog(), Arc::new(UnreachableGeocoder));
        let mut unlocated = row("2024", "30", "Dengue grave");
        unlocated.latitude.clear();
        unlocated.longitude.clear();

        let case = mapper.map(&unlocated, 7, &context()).await.unwrap();

        assert!(case.coordinate.is_none());
        let output = logs.contents();
        assert!(output.contains("Row imported without coordinates after geocoder faults"));
        assert!(output.contains("row=7"));
        assert!(output.contains("attempts="));
    }
}
