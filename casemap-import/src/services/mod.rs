//! Import pipeline components
//!
//! - `coordinate_parser`: coordinate text → decimal
//! - `request_gate`: shared pacing for outbound geocoder requests
//! - `geocoding_client`: Nominatim-compatible `Geocoder`
//! - `geocode_resolver`: tiered coordinate resolution
//! - `row_mapper`: raw row → validated case
//! - `file_reader`: CSV / workbook decoding
//! - `batch_importer`: whole-file orchestration

pub mod batch_importer;
pub mod coordinate_parser;
pub mod file_reader;
pub mod geocode_resolver;
pub mod geocoding_client;
pub mod request_gate;
pub mod row_mapper;

pub use batch_importer::{BatchImporter, ImportSource, InitialState};
pub use coordinate_parser::parse_coordinate;
pub use file_reader::{read_rows, FileFormat};
pub use geocode_resolver::{GeocodeResolver, LocationCandidates, ResolverSettings};
pub use geocoding_client::NominatimClient;
pub use request_gate::{MinIntervalGate, NoDelayGate, RequestGate};
pub use row_mapper::{MappingContext, RowMapper, RowMappingError};
