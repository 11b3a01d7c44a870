use thiserror::Error;

/// Structural import failures. Any of these rejects the whole upload; row
/// level problems are reported through [`super::ImportSummary::errors`]
/// instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No file received (field 'file').")]
    NoFile,

    #[error("Unsupported format '{0}'. Use an .xlsx file.")]
    UnsupportedFormat(String),

    #[error("Could not read the Excel file: {0}")]
    Unreadable(String),

    #[error("The file contains no data rows.")]
    Empty,

    #[error("Missing required column: {0}.")]
    MissingColumn(&'static str),
}
