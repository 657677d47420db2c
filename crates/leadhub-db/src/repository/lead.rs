//! SurrealDB implementation of [`LeadRepository`].
//!
//! Notes are embedded in the lead document as an ordered array of
//! objects, mutated by rewriting the array inside a single UPDATE.

use chrono::{DateTime, Utc};
use leadhub_core::error::LeadHubResult;
use leadhub_core::models::lead::{
    CreateLead, Lead, LeadFilter, LeadSort, LeadSortField, LeadStatus, Note, UpdateLead,
};
use leadhub_core::repository::{LeadRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Clone, SurrealValue)]
struct NoteRow {
    id: String,
    content: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl NoteRow {
    fn try_into_note(self) -> Result<Note, DbError> {
        Ok(Note {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| DbError::Query(format!("invalid note UUID: {e}")))?,
            content: self.content,
            created_by: Uuid::parse_str(&self.created_by)
                .map_err(|e| DbError::Query(format!("invalid note creator UUID: {e}")))?,
            created_at: self.created_at,
        })
    }

    fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            content: note.content.clone(),
            created_by: note.created_by.to_string(),
            created_at: note.created_at,
        }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct LeadRow {
    name: String,
    email: String,
    phone: String,
    source: String,
    status: String,
    tags: Vec<String>,
    notes: Vec<NoteRow>,
    assigned_to: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct LeadRowWithId {
    record_id: String,
    name: String,
    email: String,
    phone: String,
    source: String,
    status: String,
    tags: Vec<String>,
    notes: Vec<NoteRow>,
    assigned_to: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<LeadStatus, DbError> {
    LeadStatus::parse(s).ok_or_else(|| DbError::Query(format!("unknown lead status: {s}")))
}

fn parse_opt_uuid(s: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Query(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

impl LeadRow {
    fn into_lead(self, id: Uuid) -> Result<Lead, DbError> {
        Ok(Lead {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            source: self.source,
            status: parse_status(&self.status)?,
            tags: self.tags,
            notes: self
                .notes
                .into_iter()
                .map(NoteRow::try_into_note)
                .collect::<Result<Vec<_>, _>>()?,
            assigned_to: parse_opt_uuid(self.assigned_to, "assigned_to")?,
            created_by: Uuid::parse_str(&self.created_by)
                .map_err(|e| DbError::Query(format!("invalid created_by UUID: {e}")))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl LeadRowWithId {
    fn try_into_lead(self) -> Result<Lead, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        LeadRow {
            name: self.name,
            email: self.email,
            phone: self.phone,
            source: self.source,
            status: self.status,
            tags: self.tags,
            notes: self.notes,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_lead(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for the distinct-tags aggregate.
#[derive(Debug, SurrealValue)]
struct TagsRow {
    tags: Vec<String>,
}

fn sort_field_column(field: LeadSortField) -> &'static str {
    match field {
        LeadSortField::CreatedAt => "created_at",
        LeadSortField::UpdatedAt => "updated_at",
        LeadSortField::Name => "name",
        LeadSortField::Status => "status",
    }
}

/// Builds the WHERE clause fragments for a [`LeadFilter`]. The caller
/// binds the matching parameters in [`bind_filter`].
fn filter_conditions(filter: &LeadFilter) -> Vec<&'static str> {
    let mut conditions = Vec::new();
    if filter.assigned_to.is_some() {
        conditions.push("assigned_to = $assigned_to");
    }
    if filter.status.is_some() {
        conditions.push("status = $status");
    }
    if filter.tags.is_some() {
        conditions.push("tags CONTAINSANY $tags");
    }
    if filter.source.is_some() {
        conditions.push("source = $source");
    }
    if filter.date_from.is_some() {
        conditions.push("created_at >= $date_from");
    }
    if filter.date_to.is_some() {
        conditions.push("created_at <= $date_to");
    }
    if filter.search.is_some() {
        conditions.push(
            "(string::contains(string::lowercase(name), $search) \
             OR string::contains(email, $search) \
             OR string::contains(phone, $search))",
        );
    }
    conditions
}

fn bind_filter<'a, C: Connection>(
    mut builder: surrealdb::method::Query<'a, C>,
    filter: LeadFilter,
) -> surrealdb::method::Query<'a, C> {
    if let Some(assigned_to) = filter.assigned_to {
        builder = builder.bind(("assigned_to", assigned_to.to_string()));
    }
    if let Some(status) = filter.status {
        builder = builder.bind(("status", status.as_str().to_string()));
    }
    if let Some(tags) = filter.tags {
        builder = builder.bind(("tags", tags));
    }
    if let Some(source) = filter.source {
        builder = builder.bind(("source", source));
    }
    if let Some(date_from) = filter.date_from {
        builder = builder.bind(("date_from", date_from));
    }
    if let Some(date_to) = filter.date_to {
        builder = builder.bind(("date_to", date_to));
    }
    if let Some(search) = filter.search {
        builder = builder.bind(("search", search.trim().to_lowercase()));
    }
    builder
}

fn where_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

/// SurrealDB implementation of the Lead repository.
#[derive(Clone)]
pub struct SurrealLeadRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLeadRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Fetch the raw note rows of a lead, erroring when the lead does
    /// not exist.
    async fn fetch_notes(&self, lead_id: Uuid) -> Result<Vec<NoteRow>, DbError> {
        let id_str = lead_id.to_string();
        let mut result = self
            .db
            .query("SELECT notes FROM type::record('lead', $id)")
            .bind(("id", id_str.clone()))
            .await?;

        #[derive(Debug, SurrealValue)]
        struct NotesRow {
            notes: Vec<NoteRow>,
        }

        let rows: Vec<NotesRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;
        Ok(row.notes)
    }

    /// Rewrite the full notes array of a lead.
    async fn store_notes(&self, lead_id: Uuid, notes: Vec<NoteRow>) -> Result<Lead, DbError> {
        let id_str = lead_id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('lead', $id) SET \
                 notes = $notes, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("notes", notes))
            .await?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<LeadRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;
        row.into_lead(lead_id)
    }
}

impl<C: Connection> LeadRepository for SurrealLeadRepository<C> {
    async fn create(&self, input: CreateLead) -> LeadHubResult<Lead> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('lead', $id) SET \
                 name = $name, email = $email, phone = $phone, \
                 source = $source, status = $status, \
                 tags = $tags, notes = [], \
                 assigned_to = $assigned_to, created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("phone", input.phone))
            .bind(("source", input.source))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("tags", input.tags))
            .bind(("assigned_to", input.assigned_to.map(|u| u.to_string())))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<LeadRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;

        Ok(row.into_lead(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> LeadHubResult<Lead> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('lead', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeadRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;

        Ok(row.into_lead(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateLead) -> LeadHubResult<Lead> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.source.is_some() {
            sets.push("source = $source");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        if input.assigned_to.is_some() {
            sets.push("assigned_to = $assigned_to");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('lead', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email.trim().to_lowercase()));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(source) = input.source {
            builder = builder.bind(("source", source));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(tags) = input.tags {
            builder = builder.bind(("tags", tags));
        }
        if let Some(assigned_to) = input.assigned_to {
            builder = builder.bind(("assigned_to", assigned_to.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<LeadRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lead".into(),
            id: id_str,
        })?;

        Ok(row.into_lead(id)?)
    }

    async fn delete(&self, id: Uuid) -> LeadHubResult<()> {
        self.db
            .query("DELETE type::record('lead', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        filter: LeadFilter,
        sort: LeadSort,
        pagination: Pagination,
    ) -> LeadHubResult<PaginatedResult<Lead>> {
        let conditions = filter_conditions(&filter);
        let where_clause = where_clause(&conditions);

        let count_query = format!("SELECT count() AS total FROM lead{where_clause} GROUP ALL");
        let count_builder = bind_filter(self.db.query(&count_query), filter.clone());
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM lead{where_clause} \
             ORDER BY {} {} LIMIT $limit START $offset",
            sort_field_column(sort.field),
            if sort.descending { "DESC" } else { "ASC" },
        );

        let builder = bind_filter(self.db.query(&query), filter)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<LeadRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_lead())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self, filter: LeadFilter) -> LeadHubResult<Vec<Lead>> {
        let conditions = filter_conditions(&filter);
        let where_clause = where_clause(&conditions);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM lead{where_clause} \
             ORDER BY created_at DESC"
        );

        let builder = bind_filter(self.db.query(&query), filter);
        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<LeadRowWithId> = result.take(0).map_err(DbError::from)?;

        let leads = rows
            .into_iter()
            .map(|row| row.try_into_lead())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(leads)
    }

    async fn find_duplicate(&self, email: &str, phone: &str) -> LeadHubResult<Option<Lead>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lead \
                 WHERE email = $email OR phone = $phone LIMIT 1",
            )
            .bind(("email", email.trim().to_lowercase()))
            .bind(("phone", phone.trim().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeadRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_lead()?)),
            None => Ok(None),
        }
    }

    async fn distinct_tags(&self) -> LeadHubResult<Vec<String>> {
        let mut result = self
            .db
            .query("SELECT array::group(tags) AS tags FROM lead GROUP ALL")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TagsRow> = result.take(0).map_err(DbError::from)?;
        let mut tags = rows.into_iter().next().map(|r| r.tags).unwrap_or_default();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn add_note(
        &self,
        lead_id: Uuid,
        content: String,
        created_by: Uuid,
    ) -> LeadHubResult<Lead> {
        let note = NoteRow {
            id: Uuid::new_v4().to_string(),
            content,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };

        let mut notes = self.fetch_notes(lead_id).await?;
        notes.push(note);
        Ok(self.store_notes(lead_id, notes).await?)
    }

    async fn update_note(
        &self,
        lead_id: Uuid,
        note_id: Uuid,
        content: String,
    ) -> LeadHubResult<Lead> {
        let note_id_str = note_id.to_string();
        let mut notes = self.fetch_notes(lead_id).await?;

        let note = notes
            .iter_mut()
            .find(|n| n.id == note_id_str)
            .ok_or_else(|| DbError::NotFound {
                entity: "note".into(),
                id: note_id_str.clone(),
            })?;
        note.content = content;

        Ok(self.store_notes(lead_id, notes).await?)
    }

    async fn delete_note(&self, lead_id: Uuid, note_id: Uuid) -> LeadHubResult<()> {
        let note_id_str = note_id.to_string();
        let mut notes = self.fetch_notes(lead_id).await?;

        let before = notes.len();
        notes.retain(|n| n.id != note_id_str);
        if notes.len() == before {
            return Err(DbError::NotFound {
                entity: "note".into(),
                id: note_id_str,
            }
            .into());
        }

        self.store_notes(lead_id, notes).await?;
        Ok(())
    }
}
