pub mod command;
pub mod services;
pub mod session;

pub mod errors {
    use asphalte_geo::GeoError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("service {0} is not registered")]
        UnknownService(String),
        #[error("service {id} is not a {expected}")]
        ServiceTypeMismatch { id: String, expected: &'static str },
        #[error(transparent)]
        Catalog(#[from] GeoError),
        #[error("catalog entry {code}: {reason}")]
        InvalidEntry { code: String, reason: String },
        #[error("unknown projection {0}")]
        UnknownProjection(String),
        #[error("invalid argument: {0}")]
        InvalidArgument(String),
    }
}

pub use errors::EngineError;
pub use services::{CoordinateService, GeodesyService, ServiceRegistry};
pub use session::Session;
