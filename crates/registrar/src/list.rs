//! Paged list of people with debounced surname search and in-place edit.
//!
//! The view is a plain state machine. Callers drive it: feed keystrokes with
//! [`ListView::set_search_input`], poll or await the debounced term, start a
//! fetch with [`ListView::begin_fetch`] and hand the result back through
//! [`ListView::complete_fetch`]. Only the most recently started fetch may
//! replace the displayed page.

use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ListConfig;
use crate::debounce::Debouncer;
use crate::error::{Error, Result};
use crate::form::PersonForm;
use crate::notify::{Notifier, PERSON_UPDATED, PHOTO_REQUIRED};
use crate::record::{Person, RecordId};
use crate::remote::{ListQuery, RecordClient, Transport};
use crate::validation::ValidationErrors;

/// A started fetch. Carries the query to run and the sequence number that
/// decides whether its result is still wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    query: ListQuery,
}

impl FetchTicket {
    /// The query this fetch should run.
    #[must_use]
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Position of this fetch in start order.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Result of saving an edit.
#[derive(Debug)]
pub enum EditOutcome {
    /// Nothing selected; nothing was sent.
    NoSelection,
    /// Field errors; nothing was sent.
    Invalid(ValidationErrors),
    /// No photo; nothing was sent.
    MissingPhoto,
    /// Stored remotely and replaced in the page.
    Updated(Person),
    /// The store failed; the edit stays open.
    Failed(Error),
}

/// State of the list screen.
#[derive(Debug)]
pub struct ListView {
    page: u32,
    page_size: u32,
    probe: bool,
    search_input: String,
    search: String,
    debouncer: Debouncer<String>,
    records: Vec<Person>,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    selected: Option<RecordId>,
    latest_seq: u64,
}

impl ListView {
    /// A view on page 1 with no search.
    #[must_use]
    pub fn new(page_size: u32, debounce: Duration, probe: bool) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            probe,
            search_input: String::new(),
            search: String::new(),
            debouncer: Debouncer::new(debounce),
            records: Vec::new(),
            has_more: false,
            loading: false,
            error: None,
            selected: None,
            latest_seq: 0,
        }
    }

    /// A view configured from the `list` section.
    #[must_use]
    pub fn from_config(config: &ListConfig) -> Self {
        Self::new(
            config.page_size,
            config.search_debounce(),
            config.probe_next_page,
        )
    }

    /// Current 1-based page.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows on the current page.
    #[must_use]
    pub fn records(&self) -> &[Person] {
        &self.records
    }

    /// Whether a next page exists.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The search text as typed.
    #[must_use]
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// The search term the displayed page was fetched with.
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search
    }

    /// The record being edited.
    #[must_use]
    pub fn selected(&self) -> Option<RecordId> {
        self.selected
    }

    /// Record new search text. Takes effect once typing pauses.
    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.search_input = input.into();
        self.debouncer.push(self.search_input.clone());
    }

    /// When the pending search term settles, if one is pending.
    #[must_use]
    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Adopt the debounced term if it is ready. Returns `true` when the
    /// effective term changed; the page is then back at 1 and the caller
    /// should fetch.
    pub fn poll_search(&mut self) -> bool {
        match self.debouncer.take_ready() {
            Some(term) => self.adopt_search(&term),
            None => false,
        }
    }

    /// Wait for the pending term to settle, then adopt it like
    /// [`poll_search`](Self::poll_search).
    pub async fn settle_search(&mut self) -> bool {
        match self.debouncer.settled().await {
            Some(term) => self.adopt_search(&term),
            None => false,
        }
    }

    fn adopt_search(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term == self.search {
            return false;
        }
        debug!(term, "Search term changed");
        self.search = term.to_string();
        self.page = 1;
        true
    }

    /// The query for the current page and term.
    #[must_use]
    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.page, self.page_size, Some(self.search.as_str())).with_probe(self.probe)
    }

    /// Start a fetch of the current page. Any earlier fetch still running
    /// becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_seq += 1;
        self.loading = true;
        FetchTicket {
            seq: self.latest_seq,
            query: self.query(),
        }
    }

    /// Apply a fetch result. Returns `false` and changes nothing when a newer
    /// fetch has started since `ticket` was issued.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, result: Result<Vec<Person>>) -> bool {
        if ticket.seq != self.latest_seq {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding stale fetch result"
            );
            return false;
        }
        self.loading = false;

        match result {
            Ok(mut rows) => {
                let limit = self.page_size as usize;
                self.has_more = if ticket.query.probe {
                    rows.len() > limit
                } else {
                    rows.len() == limit
                };
                rows.truncate(limit);
                debug!(
                    page = ticket.query.page,
                    rows = rows.len(),
                    has_more = self.has_more,
                    "Page loaded"
                );
                self.records = rows;
                self.error = None;
            }
            Err(err) => {
                warn!(page = ticket.query.page, error = %err, "Failed to load page");
                self.records.clear();
                self.has_more = false;
                self.error = Some(err.display_message());
            }
        }
        true
    }

    /// Fetch the current page and apply the result.
    pub async fn refresh<T: Transport>(&mut self, client: &RecordClient<T>) -> bool {
        let ticket = self.begin_fetch();
        let result = client.list(ticket.query()).await;
        self.complete_fetch(&ticket, result)
    }

    /// Move to the next page if there is one. The caller should fetch.
    pub fn next_page(&mut self) -> bool {
        if !self.has_more {
            return false;
        }
        self.page += 1;
        true
    }

    /// Move to the previous page if not on the first. The caller should
    /// fetch.
    pub fn previous_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Jump to `page` (at least 1). The caller should fetch.
    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Apply a search term at once, skipping the quiet period.
    pub fn set_search_now(&mut self, term: impl Into<String>) -> bool {
        self.debouncer.cancel();
        self.search_input = term.into();
        let term = self.search_input.clone();
        self.adopt_search(&term)
    }

    /// Open a record from the current page for editing.
    pub fn begin_edit(&mut self, id: RecordId) -> Option<PersonForm> {
        let person = self.records.iter().find(|p| p.id == Some(id))?.clone();
        self.selected = Some(id);
        Some(PersonForm::from_person(person))
    }

    /// Close the editor without saving.
    pub fn cancel_edit(&mut self) {
        self.selected = None;
    }

    /// Validate and store the edited record, then show it in place.
    pub async fn save_edit<T: Transport>(
        &mut self,
        form: &mut PersonForm,
        client: &RecordClient<T>,
        notifier: &mut Notifier,
        today: NaiveDate,
    ) -> EditOutcome {
        let Some(id) = self.selected else {
            debug!("Save requested with nothing selected");
            return EditOutcome::NoSelection;
        };

        if let Err(err) = form.check(today) {
            return match err {
                Error::Validation(errors) => EditOutcome::Invalid(errors),
                Error::MissingPhoto => {
                    notifier.danger(PHOTO_REQUIRED);
                    EditOutcome::MissingPhoto
                }
                other => EditOutcome::Failed(other),
            };
        }

        match client.update(id, form.person(), today).await {
            Ok(updated) => {
                if let Some(slot) = self.records.iter_mut().find(|p| p.id == Some(id)) {
                    *slot = form.person().clone();
                    slot.id = Some(id);
                }
                self.selected = None;
                info!(%id, "Edit saved");
                notifier.success(PERSON_UPDATED);
                EditOutcome::Updated(updated)
            }
            Err(err) => {
                notifier.danger(err.display_message());
                EditOutcome::Failed(err)
            }
        }
    }
}
