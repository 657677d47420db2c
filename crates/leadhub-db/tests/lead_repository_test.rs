//! Integration tests for the Lead repository using in-memory SurrealDB.

use leadhub_core::models::lead::{
    CreateLead, LeadFilter, LeadSort, LeadSortField, LeadStatus, UpdateLead,
};
use leadhub_core::repository::{LeadRepository, Pagination};
use leadhub_db::repository::SurrealLeadRepository;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use uuid::Uuid;

async fn setup() -> Surreal<Any> {
    let db = any::connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leadhub_db::run_migrations(&db).await.unwrap();
    db
}

fn lead_input(name: &str, email: &str, phone: &str, created_by: Uuid) -> CreateLead {
    CreateLead {
        name: name.into(),
        email: email.into(),
        phone: phone.into(),
        source: "Website".into(),
        status: LeadStatus::New,
        tags: vec![],
        assigned_to: None,
        created_by,
    }
}

#[tokio::test]
async fn create_and_get_lead() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();

    let mut input = lead_input("Jane Roe", "Jane@Example.com", "555-0100", creator);
    input.tags = vec!["hot".into(), "q3".into()];

    let lead = repo.create(input).await.unwrap();

    assert_eq!(lead.name, "Jane Roe");
    // Email is normalized on write.
    assert_eq!(lead.email, "jane@example.com");
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.tags, vec!["hot".to_string(), "q3".into()]);
    assert!(lead.notes.is_empty());
    assert!(lead.assigned_to.is_none());
    assert_eq!(lead.created_by, creator);

    let fetched = repo.get_by_id(lead.id).await.unwrap();
    assert_eq!(fetched.id, lead.id);
}

#[tokio::test]
async fn get_missing_lead_is_not_found() {
    let repo = SurrealLeadRepository::new(setup().await);
    assert!(repo.get_by_id(Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn update_lead_fields_and_assignment() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();
    let agent = Uuid::new_v4();

    let lead = repo
        .create(lead_input("John", "john@example.com", "555-0101", creator))
        .await
        .unwrap();

    let updated = repo
        .update(
            lead.id,
            UpdateLead {
                status: Some(LeadStatus::Contacted),
                tags: Some(vec!["warm".into()]),
                assigned_to: Some(agent),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, LeadStatus::Contacted);
    assert_eq!(updated.tags, vec!["warm".to_string()]);
    assert_eq!(updated.assigned_to, Some(agent));
    assert_eq!(updated.name, "John"); // unchanged
    assert_eq!(updated.created_by, creator); // immutable
}

#[tokio::test]
async fn delete_lead_removes_record() {
    let repo = SurrealLeadRepository::new(setup().await);

    let lead = repo
        .create(lead_input("Gone", "gone@example.com", "555-0102", Uuid::new_v4()))
        .await
        .unwrap();

    repo.delete(lead.id).await.unwrap();
    assert!(repo.get_by_id(lead.id).await.is_err());
}

#[tokio::test]
async fn list_scoped_to_assignee_excludes_unassigned() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();
    let agent = Uuid::new_v4();

    let mut mine = lead_input("Mine", "mine@example.com", "555-0103", creator);
    mine.assigned_to = Some(agent);
    repo.create(mine).await.unwrap();

    let mut other = lead_input("Other", "other@example.com", "555-0104", creator);
    other.assigned_to = Some(Uuid::new_v4());
    repo.create(other).await.unwrap();

    // Unassigned lead.
    repo.create(lead_input("Nobody", "nobody@example.com", "555-0105", creator))
        .await
        .unwrap();

    let result = repo
        .list(
            LeadFilter {
                assigned_to: Some(agent),
                ..Default::default()
            },
            LeadSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].name, "Mine");
}

#[tokio::test]
async fn list_filters_and_pagination() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();

    for i in 0..5 {
        let mut input = lead_input(
            &format!("Lead {i}"),
            &format!("lead-{i}@example.com"),
            &format!("555-02{i:02}"),
            creator,
        );
        if i < 2 {
            input.status = LeadStatus::Won;
        }
        if i % 2 == 0 {
            input.tags = vec!["priority".into()];
        }
        repo.create(input).await.unwrap();
    }

    // Status filter.
    let won = repo
        .list(
            LeadFilter {
                status: Some(LeadStatus::Won),
                ..Default::default()
            },
            LeadSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(won.total, 2);

    // Tag filter.
    let tagged = repo
        .list(
            LeadFilter {
                tags: Some(vec!["priority".into()]),
                ..Default::default()
            },
            LeadSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(tagged.total, 3);

    // Search over name/email/phone.
    let searched = repo
        .list(
            LeadFilter {
                search: Some("lead-3".into()),
                ..Default::default()
            },
            LeadSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 1);

    // Pagination.
    let page1 = repo
        .list(
            LeadFilter::default(),
            LeadSort {
                field: LeadSortField::Name,
                descending: false,
            },
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page1.total, 5);
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.items[0].name, "Lead 0");

    let page2 = repo
        .list(
            LeadFilter::default(),
            LeadSort {
                field: LeadSortField::Name,
                descending: false,
            },
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);
}

#[tokio::test]
async fn find_duplicate_matches_email_case_insensitively_or_phone() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();

    let lead = repo
        .create(lead_input("Dup", "dup@example.com", "555-0300", creator))
        .await
        .unwrap();

    // Same email, different case.
    let by_email = repo
        .find_duplicate("DUP@Example.COM", "555-9999")
        .await
        .unwrap();
    assert_eq!(by_email.map(|l| l.id), Some(lead.id));

    // Same phone, different email.
    let by_phone = repo
        .find_duplicate("nope@example.com", "555-0300")
        .await
        .unwrap();
    assert!(by_phone.is_some());

    // Neither matches.
    assert!(
        repo.find_duplicate("fresh@example.com", "555-9999")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn distinct_tags_deduplicates() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();

    let mut a = lead_input("A", "a@example.com", "555-0400", creator);
    a.tags = vec!["hot".into(), "q3".into()];
    repo.create(a).await.unwrap();

    let mut b = lead_input("B", "b@example.com", "555-0401", creator);
    b.tags = vec!["hot".into(), "cold".into()];
    repo.create(b).await.unwrap();

    let tags = repo.distinct_tags().await.unwrap();
    assert_eq!(tags, vec!["cold".to_string(), "hot".into(), "q3".into()]);
}

#[tokio::test]
async fn note_lifecycle() {
    let repo = SurrealLeadRepository::new(setup().await);
    let creator = Uuid::new_v4();
    let author = Uuid::new_v4();

    let lead = repo
        .create(lead_input("Noted", "noted@example.com", "555-0500", creator))
        .await
        .unwrap();

    // Add two notes; order is preserved.
    let lead = repo
        .add_note(lead.id, "first contact".into(), author)
        .await
        .unwrap();
    let lead = repo
        .add_note(lead.id, "follow up".into(), author)
        .await
        .unwrap();
    assert_eq!(lead.notes.len(), 2);
    assert_eq!(lead.notes[0].content, "first contact");
    assert_eq!(lead.notes[1].content, "follow up");
    assert_eq!(lead.notes[0].created_by, author);

    // Update one.
    let note_id = lead.notes[0].id;
    let lead = repo
        .update_note(lead.id, note_id, "first call".into())
        .await
        .unwrap();
    assert_eq!(lead.notes[0].content, "first call");
    assert_eq!(lead.notes.len(), 2);

    // Delete it.
    repo.delete_note(lead.id, note_id).await.unwrap();
    let lead = repo.get_by_id(lead.id).await.unwrap();
    assert_eq!(lead.notes.len(), 1);
    assert_eq!(lead.notes[0].content, "follow up");

    // Unknown note id is a not-found.
    assert!(repo.delete_note(lead.id, Uuid::new_v4()).await.is_err());
}
