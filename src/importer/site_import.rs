use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::NewSite;
use crate::importer::error::ImportError;
use crate::importer::header::canonical_key;
use crate::importer::sheet;

/// Required canonical columns and the site fields they populate.
const REQUIRED_COLUMNS: &[&str] = &["ei_site_id", "site_name"];

/// Lookup/insert seam between the importer and the record store. The
/// production implementation is repository-backed; tests use an in-memory one.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    async fn site_id_exists(&self, site_id: &str) -> anyhow::Result<bool>;
    /// Case-insensitive exact match on vendor name.
    async fn vendor_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>>;
    /// Case-insensitive exact match on risk assessment name.
    async fn risk_assessment_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>>;
    async fn user_exists(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn insert_site(&self, site: NewSite) -> anyhow::Result<()>;
}

/// Per-file import result. `errors` holds line-numbered, human-readable
/// messages; a row may contribute several.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}

enum RowOutcome {
    Created,
    Skipped,
}

pub struct SiteImporter<'a, D: SiteDirectory> {
    directory: &'a D,
}

impl<'a, D: SiteDirectory> SiteImporter<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Decode an uploaded workbook and import its rows.
    pub async fn import_workbook(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ImportSummary, ImportError> {
        let sheet = sheet::read_workbook(filename, bytes)?;
        self.import_rows(&sheet.header, &sheet.rows).await
    }

    /// Import pre-parsed rows. Row numbers in error messages are 1-based with
    /// the header on line 1, so the first data row is line 2.
    pub async fn import_rows(
        &self,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<ImportSummary, ImportError> {
        let columns = column_map(header);
        for &required in REQUIRED_COLUMNS {
            if !columns.contains_key(required) {
                return Err(ImportError::MissingColumn(required));
            }
        }
        if rows.is_empty() {
            return Err(ImportError::Empty);
        }

        let mut summary = ImportSummary::default();
        for (idx, row) in rows.iter().enumerate() {
            let line = idx + 2;
            match self
                .process_row(&columns, row, line, &mut summary.errors)
                .await
            {
                Ok(RowOutcome::Created) => summary.created += 1,
                Ok(RowOutcome::Skipped) => summary.skipped += 1,
                // Unexpected per-row failures (store errors included) become a
                // line error; the remaining rows still run.
                Err(e) => summary.errors.push(format!("L{line}: {e}")),
            }
        }

        tracing::info!(
            created = summary.created,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "site import finished"
        );
        Ok(summary)
    }

    async fn process_row(
        &self,
        columns: &HashMap<String, usize>,
        row: &[String],
        line: usize,
        errors: &mut Vec<String>,
    ) -> anyhow::Result<RowOutcome> {
        let site_id = cell(columns, row, "ei_site_id").unwrap_or_default();
        let name = cell(columns, row, "site_name").unwrap_or_default();
        if site_id.is_empty() || name.is_empty() {
            errors.push(format!("L{line}: 'site_id' or 'name' missing."));
            return Ok(RowOutcome::Skipped);
        }

        // Duplicate business id: skip without an error entry
        if self.directory.site_id_exists(site_id).await? {
            return Ok(RowOutcome::Skipped);
        }

        let latitude = parse_coordinate(cell(columns, row, "latitude"), "latitude", line, errors);
        let longitude =
            parse_coordinate(cell(columns, row, "longitude"), "longitude", line, errors);
        let security_type = cell(columns, row, "security_type").map(str::to_string);

        let mut vendor_id = None;
        if let Some(raw) = cell(columns, row, "vendor") {
            match self.directory.vendor_by_name(raw).await? {
                Some(id) => vendor_id = Some(id),
                None => errors.push(format!("L{line}: Vendor not found (name='{raw}').")),
            }
        }

        let mut risk_assessment_id = None;
        if let Some(raw) = cell(columns, row, "risk_assessment") {
            match self.directory.risk_assessment_by_name(raw).await? {
                Some(id) => risk_assessment_id = Some(id),
                None => errors.push(format!("L{line}: RiskAssessment not found (name='{raw}').")),
            }
        }

        let mut zm_id = None;
        if let Some(raw) = cell(columns, row, "zm") {
            match Uuid::parse_str(raw) {
                Ok(id) => {
                    if self.directory.user_exists(id).await? {
                        zm_id = Some(id);
                    } else {
                        errors.push(format!("L{line}: User (ZM) not found (id='{raw}')."));
                    }
                }
                Err(_) => errors.push(format!("L{line}: invalid ZM id ('{raw}').")),
            }
        }

        // Unresolved references degrade to null; the site is created anyway
        self.directory
            .insert_site(NewSite {
                site_id: site_id.to_string(),
                name: name.to_string(),
                latitude,
                longitude,
                security_type,
                vendor_id,
                risk_assessment_id,
                zm_id,
            })
            .await?;

        Ok(RowOutcome::Created)
    }
}

/// Canonical header key -> column index. Later duplicate headers win.
fn column_map(header: &[String]) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, raw)| (canonical_key(raw), i))
        .collect()
}

/// Trimmed, non-empty cell under a canonical column key.
fn cell<'r>(columns: &HashMap<String, usize>, row: &'r [String], key: &str) -> Option<&'r str> {
    let index = *columns.get(key)?;
    row.get(index)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_coordinate(
    raw: Option<&str>,
    field: &str,
    line: usize,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let raw = raw?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(format!("L{line}: invalid {field} ('{raw}')."));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory directory with pre-seeded vendors/risks/users.
    #[derive(Default)]
    struct InMemoryDirectory {
        vendors: HashMap<String, Uuid>,
        risks: HashMap<String, Uuid>,
        users: HashSet<Uuid>,
        existing_site_ids: Mutex<HashSet<String>>,
        inserted: Mutex<Vec<NewSite>>,
        fail_inserts_for: Option<String>,
    }

    impl InMemoryDirectory {
        fn with_vendor(mut self, name: &str) -> Self {
            self.vendors.insert(name.to_lowercase(), Uuid::new_v4());
            self
        }

        fn with_risk(mut self, name: &str) -> Self {
            self.risks.insert(name.to_lowercase(), Uuid::new_v4());
            self
        }

        fn with_user(mut self, id: Uuid) -> Self {
            self.users.insert(id);
            self
        }

        fn inserted(&self) -> Vec<NewSite> {
            self.inserted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SiteDirectory for InMemoryDirectory {
        async fn site_id_exists(&self, site_id: &str) -> anyhow::Result<bool> {
            Ok(self.existing_site_ids.lock().unwrap().contains(site_id))
        }

        async fn vendor_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>> {
            Ok(self.vendors.get(&name.to_lowercase()).copied())
        }

        async fn risk_assessment_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>> {
            Ok(self.risks.get(&name.to_lowercase()).copied())
        }

        async fn user_exists(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.users.contains(&id))
        }

        async fn insert_site(&self, site: NewSite) -> anyhow::Result<()> {
            if self.fail_inserts_for.as_deref() == Some(site.site_id.as_str()) {
                anyhow::bail!("insert failed");
            }
            self.existing_site_ids
                .lock()
                .unwrap()
                .insert(site.site_id.clone());
            self.inserted.lock().unwrap().push(site);
            Ok(())
        }
    }

    fn header() -> Vec<String> {
        [
            "EI Site ID",
            "Site Name",
            "Latitude",
            "Longitude",
            "Vendor",
            "risk_assessment",
            "zm",
            "security_type",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn unresolved_references_degrade_to_null() {
        let directory = InMemoryDirectory::default().with_risk("Red");
        let importer = SiteImporter::new(&directory);

        let rows = vec![row(&[
            "CDKN00001",
            "KASALA",
            "-4.325",
            "15.322",
            "Unknown",
            "Red",
            "bad-uuid",
            "indoor",
        ])];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors.len(), 2);
        assert!(summary.errors.iter().all(|e| e.starts_with("L2:")));
        assert!(summary.errors.iter().any(|e| e.contains("Vendor")));
        assert!(summary.errors.iter().any(|e| e.contains("ZM")));

        let inserted = directory.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].site_id, "CDKN00001");
        assert_eq!(inserted[0].latitude, Some(-4.325));
        assert_eq!(inserted[0].longitude, Some(15.322));
        assert!(inserted[0].vendor_id.is_none());
        assert!(inserted[0].risk_assessment_id.is_some());
        assert!(inserted[0].zm_id.is_none());
        assert_eq!(inserted[0].security_type.as_deref(), Some("indoor"));
    }

    #[tokio::test]
    async fn missing_required_column_rejects_file() {
        let directory = InMemoryDirectory::default();
        let importer = SiteImporter::new(&directory);

        let header: Vec<String> = vec!["EI Site ID".to_string(), "Latitude".to_string()];
        let rows = vec![row(&["CDKN00001", "-4.325"])];
        let err = importer.import_rows(&header, &rows).await.unwrap_err();

        assert!(matches!(err, ImportError::MissingColumn("site_name")));
        assert!(directory.inserted().is_empty());
    }

    #[tokio::test]
    async fn zero_data_rows_rejects_file() {
        let directory = InMemoryDirectory::default();
        let importer = SiteImporter::new(&directory);

        let err = importer.import_rows(&header(), &[]).await.unwrap_err();
        assert!(matches!(err, ImportError::Empty));
    }

    #[tokio::test]
    async fn empty_site_id_is_skipped_and_logged() {
        let directory = InMemoryDirectory::default();
        let importer = SiteImporter::new(&directory);

        let rows = vec![row(&["", "KASALA", "", "", "", "", "", ""])];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("L2:"));
        assert!(directory.inserted().is_empty());
    }

    #[tokio::test]
    async fn duplicate_site_id_is_skipped_silently() {
        let directory = InMemoryDirectory::default();
        directory
            .existing_site_ids
            .lock()
            .unwrap()
            .insert("CDKN00001".to_string());
        let importer = SiteImporter::new(&directory);

        let rows = vec![row(&["CDKN00001", "KASALA", "", "", "", "", "", ""])];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 0);
        assert_eq!(summary.skipped, 1);
        assert!(summary.errors.is_empty());
    }

    #[tokio::test]
    async fn reimport_is_idempotent() {
        let directory = InMemoryDirectory::default();
        let importer = SiteImporter::new(&directory);

        let rows = vec![
            row(&["CDKN00001", "KASALA", "", "", "", "", "", ""]),
            row(&["CDKN00002", "LUBUMBASHI", "", "", "", "", "", ""]),
        ];

        let first = importer.import_rows(&header(), &rows).await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.skipped, 0);

        let second = importer.import_rows(&header(), &rows).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 2);
        assert!(second.errors.is_empty());
    }

    #[tokio::test]
    async fn store_failure_on_one_row_does_not_stop_the_batch() {
        let directory = InMemoryDirectory {
            fail_inserts_for: Some("CDKN00002".to_string()),
            ..Default::default()
        };
        let importer = SiteImporter::new(&directory);

        let rows = vec![
            row(&["CDKN00001", "KASALA", "", "", "", "", "", ""]),
            row(&["CDKN00002", "GOMA", "", "", "", "", "", ""]),
            row(&["CDKN00003", "KINDU", "", "", "", "", "", ""]),
        ];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("L3:"));

        // Every row is accounted for
        assert_eq!(
            summary.created as usize + summary.skipped as usize + summary.errors.len(),
            rows.len()
        );
    }

    #[tokio::test]
    async fn resolved_references_are_linked() {
        let zm = Uuid::new_v4();
        let directory = InMemoryDirectory::default()
            .with_vendor("Netis RDC")
            .with_risk("Red")
            .with_user(zm);
        let importer = SiteImporter::new(&directory);

        let rows = vec![row(&[
            "CDKN00001",
            "KASALA",
            "",
            "",
            "netis rdc",
            "RED",
            &zm.to_string(),
            "",
        ])];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 1);
        assert!(summary.errors.is_empty());
        let inserted = directory.inserted();
        assert!(inserted[0].vendor_id.is_some());
        assert!(inserted[0].risk_assessment_id.is_some());
        assert_eq!(inserted[0].zm_id, Some(zm));
    }

    #[tokio::test]
    async fn unparseable_coordinates_null_out_with_an_error() {
        let directory = InMemoryDirectory::default();
        let importer = SiteImporter::new(&directory);

        let rows = vec![row(&["CDKN00001", "KASALA", "north-ish", "", "", "", "", ""])];
        let summary = importer.import_rows(&header(), &rows).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("latitude"));
        assert!(directory.inserted()[0].latitude.is_none());
    }
}
