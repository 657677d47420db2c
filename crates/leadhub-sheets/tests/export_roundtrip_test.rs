//! Export → parse → re-import round-trip.
//!
//! Re-importing an export of the same lead set must reproduce the
//! name/email/phone/source/status/tags of every lead and flag all of
//! them as duplicates (idempotence of duplicate detection).

use std::collections::HashMap;

use leadhub_core::models::lead::{CreateLead, LeadStatus};
use leadhub_core::repository::LeadRepository;
use leadhub_db::repository::{SurrealLeadRepository, SurrealUserRepository};
use leadhub_sheets::export::ExportUserRef;
use leadhub_sheets::{RowErrorKind, build_export_workbook, import_rows, read_rows};
use surrealdb::engine::any::{self, Any};
use uuid::Uuid;

async fn setup() -> (SurrealUserRepository<Any>, SurrealLeadRepository<Any>) {
    let db = any::connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leadhub_db::run_migrations(&db).await.unwrap();
    (
        SurrealUserRepository::new(db.clone()),
        SurrealLeadRepository::new(db),
    )
}

#[tokio::test]
async fn export_then_reimport_flags_every_row_as_duplicate() {
    let (users, leads) = setup().await;
    let creator = Uuid::new_v4();

    let seeded = vec![
        ("Jane Roe", "jane@example.com", "555-0100", "Website", LeadStatus::Won, vec!["hot"]),
        ("John Doe", "john@example.com", "555-0101", "Referral", LeadStatus::New, vec![]),
        ("Ada Lovelace", "ada@example.com", "555-0102", "Webinar", LeadStatus::Qualified, vec!["vip", "q3"]),
    ];

    let mut stored = Vec::new();
    for (name, email, phone, source, status, tags) in &seeded {
        stored.push(
            leads
                .create(CreateLead {
                    name: (*name).into(),
                    email: (*email).into(),
                    phone: (*phone).into(),
                    source: (*source).into(),
                    status: *status,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    assigned_to: None,
                    created_by: creator,
                })
                .await
                .unwrap(),
        );
    }

    // Export...
    let bytes = build_export_workbook(&stored, &HashMap::<Uuid, ExportUserRef>::new()).unwrap();
    let tmp = tempfile::NamedTempFile::with_suffix(".xlsx").unwrap();
    std::fs::write(tmp.path(), &bytes).unwrap();

    // ...parse it back...
    let rows = read_rows(tmp.path()).unwrap();
    assert_eq!(rows.len(), stored.len());

    // Exported rows carry the equivalent core fields (export order is
    // newest first, so match by email).
    for (name, email, phone, source, status, tags) in &seeded {
        let row = rows
            .iter()
            .find(|r| r.get("email") == Some(*email))
            .unwrap_or_else(|| panic!("no exported row for {email}"));
        assert_eq!(row.get("name"), Some(*name));
        assert_eq!(row.get("phone"), Some(*phone));
        assert_eq!(row.get("source"), Some(*source));
        assert_eq!(row.get("status"), Some(status.as_str()));
        let expected_tags = tags.join(", ");
        if expected_tags.is_empty() {
            assert_eq!(row.get("tags"), None);
        } else {
            assert_eq!(row.get("tags"), Some(expected_tags.as_str()));
        }
    }

    // ...and re-import: every row must be flagged as a duplicate.
    let report = import_rows(&users, &leads, rows, creator).await.unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, seeded.len());
    assert!(
        report
            .errors
            .iter()
            .all(|e| e.error == RowErrorKind::DuplicateLead)
    );
}

#[tokio::test]
async fn malformed_file_is_fatal() {
    let tmp = tempfile::NamedTempFile::with_suffix(".xlsx").unwrap();
    std::fs::write(tmp.path(), b"this is not a workbook").unwrap();
    assert!(read_rows(tmp.path()).is_err());
}
