use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    #[error("projection {code}: invalid bounds x=[{min_x}, {max_x}] y=[{min_y}, {max_y}]")]
    InvalidBounds {
        code: String,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },
    #[error("projection {code}: invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        code: String,
        name: &'static str,
        reason: String,
    },
    #[error("projection code must not be empty")]
    EmptyCode,
    #[error("projection code {0} is defined more than once")]
    DuplicateCode(String),
    #[error("unknown projection code {0}")]
    UnknownCode(String),
}
