use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("lattice radius must be non-negative, got {0}")]
    NegativeRadius(i32),

    #[error("coordinate ({x}, {y}, {z}) is off the x + y + z = 0 plane")]
    OffPlane { x: i32, y: i32, z: i32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
