//! In-process stand-in for the remote store.
//!
//! Keeps rows in insertion order and answers list queries with the same
//! offset, limit and surname filter the real store applies. Every request
//! is counted and the last one of each kind is kept for inspection.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use super::query::ListQuery;
use super::wire::{CreateBody, UpdateBody, WireRecord};
use super::Transport;
use crate::error::{Error, Result};
use crate::record::{Person, RecordId};

/// Requests served so far, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    /// Create requests.
    pub posts: usize,
    /// List requests.
    pub gets: usize,
    /// Update requests.
    pub patches: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<WireRecord>,
    next_id: u64,
    counts: RequestCounts,
    fail_next: Option<(Option<u16>, String)>,
    last_query: Option<ListQuery>,
    last_create: Option<CreateBody>,
    last_update: Option<(RecordId, UpdateBody)>,
}

/// A table held in memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-filled with `people`, ids assigned from 1.
    #[must_use]
    pub fn with_people(people: impl IntoIterator<Item = Person>, today: NaiveDate) -> Self {
        let transport = Self::new();
        {
            let mut state = transport.lock();
            for person in people {
                state.next_id += 1;
                let id = state.next_id;
                let row = WireRecord::from_update(id, &UpdateBody::for_update(&person, today));
                state.rows.push(row);
            }
        }
        transport
    }

    /// Make the next request fail with the given status and message.
    pub fn fail_next(&self, status: Option<u16>, message: impl Into<String>) {
        self.lock().fail_next = Some((status, message.into()));
    }

    /// Requests served so far.
    #[must_use]
    pub fn counts(&self) -> RequestCounts {
        self.lock().counts
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the stored rows.
    #[must_use]
    pub fn rows(&self) -> Vec<WireRecord> {
        self.lock().rows.clone()
    }

    /// The most recent list query.
    #[must_use]
    pub fn last_query(&self) -> Option<ListQuery> {
        self.lock().last_query.clone()
    }

    /// The most recent create body.
    #[must_use]
    pub fn last_create(&self) -> Option<CreateBody> {
        self.lock().last_create.clone()
    }

    /// The most recent update target and body.
    #[must_use]
    pub fn last_update(&self) -> Option<(RecordId, UpdateBody)> {
        self.lock().last_update.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MemoryState {
    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some((status, message)) => Err(Error::remote(status, message)),
            None => Ok(()),
        }
    }
}

fn matches_search(row: &WireRecord, search: Option<&str>) -> bool {
    search.map_or(true, |term| {
        row.apellido_paterno
            .to_lowercase()
            .contains(&term.to_lowercase())
    })
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn post(&self, body: &CreateBody) -> Result<WireRecord> {
        let mut state = self.lock();
        state.counts.posts += 1;
        state.take_failure()?;

        state.next_id += 1;
        let row = WireRecord::from_create(state.next_id, body);
        debug!(id = state.next_id, "Stored new row");
        state.rows.push(row.clone());
        state.last_create = Some(body.clone());
        Ok(row)
    }

    async fn get(&self, query: &ListQuery) -> Result<Vec<WireRecord>> {
        let mut state = self.lock();
        state.counts.gets += 1;
        state.last_query = Some(query.clone());
        state.take_failure()?;

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        Ok(state
            .rows
            .iter()
            .filter(|row| matches_search(row, query.search.as_deref()))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn patch(&self, id: RecordId, body: &UpdateBody) -> Result<WireRecord> {
        let mut state = self.lock();
        state.counts.patches += 1;
        state.take_failure()?;

        let row = WireRecord::from_update(id.0, body);
        let slot = state
            .rows
            .iter_mut()
            .find(|r| r.id == Some(id.0))
            .ok_or_else(|| Error::remote(Some(404), format!("record {id} not found")))?;
        *slot = row.clone();
        state.last_update = Some((id, body.clone()));
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn people(surnames: &[&str]) -> Vec<Person> {
        surnames
            .iter()
            .map(|s| Person {
                given_name: "Test".into(),
                paternal_surname: (*s).to_string(),
                ..Person::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_pages_by_offset_and_limit() {
        let names: Vec<String> = (0..25).map(|i| format!("Surname{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let transport = MemoryTransport::with_people(people(&refs), today());

        let first = transport.get(&ListQuery::new(1, 20, None)).await.unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first[0].id, Some(1));

        let second = transport.get(&ListQuery::new(2, 20, None)).await.unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].id, Some(21));
        assert_eq!(transport.counts().gets, 2);
    }

    #[tokio::test]
    async fn test_like_filter_is_case_insensitive() {
        let transport =
            MemoryTransport::with_people(people(&["García", "Garza", "López"]), today());
        let rows = transport
            .get(&ListQuery::new(1, 20, Some("gar")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            transport.last_query().unwrap().where_clause().as_deref(),
            Some("(apellidoPaterno,like,%gar%)")
        );
    }

    #[tokio::test]
    async fn test_post_assigns_ids() {
        let transport = MemoryTransport::with_people(people(&["A"]), today());
        let body = CreateBody::for_create(&people(&["B"])[0], today()).unwrap();
        let row = transport.post(&body).await.unwrap();
        assert_eq!(row.id, Some(2));
        assert_eq!(transport.len(), 2);
        assert_eq!(transport.last_create(), Some(body));
    }

    #[tokio::test]
    async fn test_patch_unknown_id() {
        let transport = MemoryTransport::new();
        let body = UpdateBody::for_update(&people(&["A"])[0], today());
        let err = transport.patch(RecordId(5), &body).await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: Some(404), .. }));
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let transport = MemoryTransport::new();
        transport.fail_next(Some(500), "boom");

        let err = transport.get(&ListQuery::new(1, 20, None)).await.unwrap_err();
        assert_eq!(err.display_message(), "boom");
        assert!(transport.get(&ListQuery::new(1, 20, None)).await.is_ok());
    }
}
