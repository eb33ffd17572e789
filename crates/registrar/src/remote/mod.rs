//! Remote data client.
//!
//! All persistence lives in a remote table reached over HTTP. The
//! [`Transport`] trait carries the three raw requests; [`RecordClient`] sits
//! on top and speaks in [`Person`] values.

pub mod http;
pub mod memory;
pub mod query;
pub mod wire;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

pub use http::HttpTransport;
pub use memory::{MemoryTransport, RequestCounts};
pub use query::ListQuery;
pub use wire::{CreateBody, UpdateBody, WireAddress, WireDatos, WireRecord};

use crate::error::{Error, Result};
use crate::record::{Person, RecordId};

/// The raw requests the remote store understands.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Create a row.
    async fn post(&self, body: &CreateBody) -> Result<WireRecord>;

    /// Fetch one page of rows.
    async fn get(&self, query: &ListQuery) -> Result<Vec<WireRecord>>;

    /// Replace the fields of row `id`.
    async fn patch(&self, id: RecordId, body: &UpdateBody) -> Result<WireRecord>;
}

/// Person-level operations over a [`Transport`].
///
/// Cloning is cheap; clones share the transport.
#[derive(Debug)]
pub struct RecordClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for RecordClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> RecordClient<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create a person and return the row as the store recorded it. The age
    /// sent along is derived from the birth date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPhoto`] when no photo is attached, and
    /// [`Error::Remote`] when the store rejects the request or answers
    /// without a row id.
    #[instrument(skip_all, fields(surname = %person.paternal_surname))]
    pub async fn create(&self, person: &Person, today: NaiveDate) -> Result<Person> {
        if !person.address.has_photo() {
            return Err(Error::MissingPhoto);
        }
        let body = CreateBody::for_create(person, today)?;
        let row = self.transport.post(&body).await?;

        let created = stored(row, person, None);
        let Some(id) = created.id else {
            warn!("Create response carried no row id");
            return Err(Error::remote(
                None,
                "the store did not return an id for the new record",
            ));
        };
        info!(%id, "Person created");
        Ok(created)
    }

    /// Fetch one page of people. An empty page is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] when the request fails.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Person>> {
        let rows = self.transport.get(query).await?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    /// Convenience for [`list`](Self::list) without the probe row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] when the request fails.
    pub async fn list_page(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<Vec<Person>> {
        self.list(&ListQuery::new(page, page_size, search)).await
    }

    /// Replace person `id` with `person`, recomputing the age, and return
    /// the row as the store now holds it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPhoto`] when no photo is attached, and
    /// [`Error::Remote`] when the store rejects the request.
    #[instrument(skip(self, person, today))]
    pub async fn update(&self, id: RecordId, person: &Person, today: NaiveDate) -> Result<Person> {
        if !person.address.has_photo() {
            return Err(Error::MissingPhoto);
        }
        let body = UpdateBody::for_update(person, today);
        let row = self.transport.patch(id, &body).await?;

        let updated = stored(row, person, Some(id));
        info!("Person updated");
        Ok(updated)
    }
}

/// The store's copy of a written row. The id and photo fall back to what
/// was sent when the response leaves them out.
fn stored(row: WireRecord, sent: &Person, id: Option<RecordId>) -> Person {
    let mut person = Person::from(row);
    if person.id.is_none() {
        person.id = id;
    }
    if !person.address.has_photo() {
        person.address.photo.clone_from(&sent.address.photo);
    }
    person
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Address, Photo};

    /// A store that normalises what it is sent: emails are lowercased on
    /// create, names are rewritten on update, and rows come back without
    /// their address.
    #[derive(Debug, Default)]
    struct NormalizingStore {
        omit_id: bool,
    }

    #[async_trait]
    impl Transport for NormalizingStore {
        async fn post(&self, body: &CreateBody) -> Result<WireRecord> {
            let mut row = WireRecord::from_create(7, body);
            row.email = row.email.to_lowercase();
            row.datos = None;
            if self.omit_id {
                row.id = None;
            }
            Ok(row)
        }

        async fn get(&self, _query: &ListQuery) -> Result<Vec<WireRecord>> {
            Ok(Vec::new())
        }

        async fn patch(&self, _id: RecordId, body: &UpdateBody) -> Result<WireRecord> {
            let mut row = WireRecord::from_update(0, body);
            row.id = None;
            row.nombre = "Ana María".to_string();
            Ok(row)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn person(surname: &str) -> Person {
        Person {
            id: None,
            given_name: "Ana".into(),
            paternal_surname: surname.into(),
            maternal_surname: "López".into(),
            email: "ana@example.com".into(),
            birth_date: "1990-05-17".into(),
            address: Address {
                street: "Reforma".into(),
                exterior_number: "1".into(),
                neighborhood: "Centro".into(),
                municipality: "Cuauhtémoc".into(),
                state: "CDMX".into(),
                postal_code: "06000".into(),
                photo: Some(Photo::new("data:image/png;base64,AAAA")),
            },
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_sends_age() {
        let client = RecordClient::new(MemoryTransport::new());
        let created = client.create(&person("García"), today()).await.unwrap();

        assert_eq!(created.id, Some(RecordId(1)));
        let body = client.transport().last_create().unwrap();
        assert_eq!(body.edad, Some(34));
        assert!(body.address().is_ok());
    }

    #[tokio::test]
    async fn test_create_without_photo_sends_nothing() {
        let client = RecordClient::new(MemoryTransport::new());
        let mut p = person("García");
        p.address.photo = None;

        let err = client.create(&p, today()).await.unwrap_err();
        assert!(matches!(err, Error::MissingPhoto));
        assert_eq!(client.transport().counts().posts, 0);
    }

    #[tokio::test]
    async fn test_create_surfaces_remote_message() {
        let client = RecordClient::new(MemoryTransport::new());
        client.transport().fail_next(Some(400), "email already registered");

        let err = client.create(&person("García"), today()).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.display_message(), "email already registered");
    }

    #[tokio::test]
    async fn test_create_returns_stored_row() {
        let client = RecordClient::new(NormalizingStore::default());
        let mut sent = person("García");
        sent.email = "ANA@Example.com".into();

        let created = client.create(&sent, today()).await.unwrap();
        assert_eq!(created.id, Some(RecordId(7)));
        assert_eq!(created.email, "ana@example.com");
        assert_eq!(created.address.photo, sent.address.photo);
    }

    #[tokio::test]
    async fn test_create_without_returned_id_fails() {
        let client = RecordClient::new(NormalizingStore { omit_id: true });
        let err = client.create(&person("García"), today()).await.unwrap_err();
        assert!(err.is_remote());
        assert!(err.display_message().contains("id"));
    }

    #[tokio::test]
    async fn test_update_returns_stored_row() {
        let client = RecordClient::new(NormalizingStore::default());
        let mut edited = person("García");
        edited.address.street = "Madero".into();

        let updated = client.update(RecordId(3), &edited, today()).await.unwrap();
        assert_eq!(updated.id, Some(RecordId(3)));
        assert_eq!(updated.given_name, "Ana María");
        assert_eq!(updated.address.street, "Madero");
        assert!(updated.address.has_photo());
    }

    #[tokio::test]
    async fn test_list_converts_rows() {
        let client = RecordClient::new(MemoryTransport::new());
        client.create(&person("García"), today()).await.unwrap();
        client.create(&person("Ruiz"), today()).await.unwrap();

        let people = client.list_page(1, 20, Some("ruiz")).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].paternal_surname, "Ruiz");
        assert_eq!(people[0].address.street, "Reforma");

        let none = client.list_page(1, 20, Some("zzz")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_patches_object_datos() {
        let client = RecordClient::new(MemoryTransport::new());
        let created = client.create(&person("García"), today()).await.unwrap();
        let id = created.id.unwrap();

        let mut edited = created.clone();
        edited.address.street = "Madero".into();
        let updated = client.update(id, &edited, today()).await.unwrap();
        assert_eq!(updated.id, Some(id));

        let (patched_id, body) = client.transport().last_update().unwrap();
        assert_eq!(patched_id, id);
        assert_eq!(body.datos.calle, "Madero");
        assert!(matches!(
            client.transport().rows()[0].datos,
            Some(WireDatos::Object(_))
        ));
    }
}
