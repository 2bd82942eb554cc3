use thiserror::Error;

/// Every way a dashboard action can fail.
///
/// Unparseable date cells are deliberately absent: the normalizer recovers
/// those per cell and reports them through [`crate::dates::NormalizeReport`].
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Error loading data: {0}")]
    Load(String),

    #[error("File must contain columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Edit rejected: {0}")]
    Edit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// calamine only reads and rust_xlsxwriter only writes. CSV errors are mapped
// where they occur.
#[cfg(feature = "xlsx")]
impl From<calamine::XlsxError> for DashboardError {
    fn from(err: calamine::XlsxError) -> Self {
        DashboardError::Load(format!("unreadable Excel file: {}", err))
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for DashboardError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        DashboardError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
