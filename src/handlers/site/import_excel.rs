use axum::{extract::Multipart, Json};

use crate::database::manager::DatabaseManager;
use crate::database::repository::PgSiteDirectory;
use crate::error::ApiError;
use crate::importer::{ImportError, ImportSummary, SiteImporter};

/// POST /sites/import-excel - bulk import sites from an uploaded .xlsx file.
///
/// Responds 200 with `{created, skipped, errors}` even when individual rows
/// failed; only structural problems (no file, wrong format, unreadable or
/// empty workbook, missing required columns) produce a 400.
pub async fn import_excel(mut multipart: Multipart) -> Result<Json<ImportSummary>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Could not read upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = match upload {
        Some(u) => u,
        None => return Err(ImportError::NoFile.into()),
    };

    tracing::info!(file = %filename, size = bytes.len(), "importing sites from upload");

    let pool = DatabaseManager::pool().await?;
    let directory = PgSiteDirectory::new(pool);
    let importer = SiteImporter::new(&directory);

    let summary = importer.import_workbook(&filename, &bytes).await?;
    Ok(Json(summary))
}
