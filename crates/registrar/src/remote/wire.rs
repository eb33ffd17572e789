//! JSON shapes exchanged with the remote store.
//!
//! The store uses Spanish column names. Create and update disagree on how the
//! nested address travels: create embeds it as a JSON string, update sends a
//! plain object. Responses may carry either form.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::record::{Address, Person, Photo, RecordId};

/// Column holding the paternal surname, the only searchable one.
pub const SEARCH_COLUMN: &str = "apellidoPaterno";

/// The nested address object (`datos`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireAddress {
    /// Street.
    #[serde(deserialize_with = "nullable_string")]
    pub calle: String,
    /// Exterior number.
    #[serde(deserialize_with = "nullable_string")]
    pub numero: String,
    /// Neighborhood.
    #[serde(deserialize_with = "nullable_string")]
    pub colonia: String,
    /// Municipality.
    #[serde(deserialize_with = "nullable_string")]
    pub delegacion: String,
    /// State.
    #[serde(deserialize_with = "nullable_string")]
    pub estado: String,
    /// Postal code as typed.
    #[serde(deserialize_with = "nullable_string")]
    pub cp: String,
    /// Numeric postal code; `null` when `cp` is not a number.
    #[serde(rename = "codigoPostal")]
    pub codigo_postal: Option<u32>,
    /// Photo as a data URL.
    pub imagen: Option<String>,
}

impl From<&Address> for WireAddress {
    fn from(address: &Address) -> Self {
        Self {
            calle: address.street.clone(),
            numero: address.exterior_number.clone(),
            colonia: address.neighborhood.clone(),
            delegacion: address.municipality.clone(),
            estado: address.state.clone(),
            cp: address.postal_code.clone(),
            codigo_postal: address.postal_code_number(),
            imagen: address.photo.as_ref().map(|p| p.as_str().to_string()),
        }
    }
}

impl From<WireAddress> for Address {
    fn from(wire: WireAddress) -> Self {
        let postal_code = if wire.cp.is_empty() {
            wire.codigo_postal.map(|n| n.to_string()).unwrap_or_default()
        } else {
            wire.cp
        };
        Self {
            street: wire.calle,
            exterior_number: wire.numero,
            neighborhood: wire.colonia,
            municipality: wire.delegacion,
            state: wire.estado,
            postal_code,
            photo: wire
                .imagen
                .filter(|s| !s.trim().is_empty())
                .map(Photo::new),
        }
    }
}

/// Request body for create and update. `D` is the shape of `datos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonBody<D> {
    /// Given name.
    pub nombre: String,
    /// Paternal surname.
    #[serde(rename = "apellidoPaterno")]
    pub apellido_paterno: String,
    /// Maternal surname.
    #[serde(rename = "apellidoMaterno")]
    pub apellido_materno: String,
    /// Derived age.
    pub edad: Option<i32>,
    /// Email.
    pub email: String,
    /// Birth date, `YYYY-MM-DD`.
    #[serde(rename = "fechaNac")]
    pub fecha_nac: String,
    /// Nested address.
    pub datos: D,
}

/// Create body: `datos` is a JSON-encoded string.
pub type CreateBody = PersonBody<String>;

/// Update body: `datos` is an object.
pub type UpdateBody = PersonBody<WireAddress>;

impl<D> PersonBody<D> {
    fn with_datos(person: &Person, today: NaiveDate, datos: D) -> Self {
        Self {
            nombre: person.given_name.clone(),
            apellido_paterno: person.paternal_surname.clone(),
            apellido_materno: person.maternal_surname.clone(),
            edad: person.age_on(today),
            email: person.email.clone(),
            fecha_nac: person.birth_date.clone(),
            datos,
        }
    }
}

impl CreateBody {
    /// Build the create body, string-encoding the address.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the address cannot be encoded.
    pub fn for_create(person: &Person, today: NaiveDate) -> Result<Self> {
        let datos = serde_json::to_string(&WireAddress::from(&person.address))?;
        Ok(Self::with_datos(person, today, datos))
    }

    /// Decode the embedded address.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if `datos` is not an encoded address.
    pub fn address(&self) -> Result<WireAddress> {
        Ok(serde_json::from_str(&self.datos)?)
    }
}

impl UpdateBody {
    /// Build the update body with the address as an object.
    #[must_use]
    pub fn for_update(person: &Person, today: NaiveDate) -> Self {
        Self::with_datos(person, today, WireAddress::from(&person.address))
    }
}

/// `datos` as found in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireDatos {
    /// Stored as an object.
    Object(WireAddress),
    /// Stored as a JSON string.
    Encoded(String),
}

impl WireDatos {
    /// Decode into an address; an undecodable string yields an empty one.
    #[must_use]
    pub fn into_address(self) -> WireAddress {
        match self {
            Self::Object(address) => address,
            Self::Encoded(text) if text.trim().is_empty() => WireAddress::default(),
            Self::Encoded(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding undecodable address in record");
                WireAddress::default()
            }),
        }
    }
}

/// One row as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireRecord {
    /// Row id.
    #[serde(alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Given name.
    #[serde(deserialize_with = "nullable_string")]
    pub nombre: String,
    /// Paternal surname.
    #[serde(rename = "apellidoPaterno", deserialize_with = "nullable_string")]
    pub apellido_paterno: String,
    /// Maternal surname.
    #[serde(rename = "apellidoMaterno", deserialize_with = "nullable_string")]
    pub apellido_materno: String,
    /// Age as stored.
    pub edad: Option<i64>,
    /// Email.
    #[serde(deserialize_with = "nullable_string")]
    pub email: String,
    /// Birth date, `YYYY-MM-DD`.
    #[serde(rename = "fechaNac", deserialize_with = "nullable_string")]
    pub fecha_nac: String,
    /// Nested address in either form.
    pub datos: Option<WireDatos>,
}

impl WireRecord {
    /// Row as the store would keep it after a create.
    #[must_use]
    pub fn from_create(id: u64, body: &CreateBody) -> Self {
        Self {
            id: Some(id),
            nombre: body.nombre.clone(),
            apellido_paterno: body.apellido_paterno.clone(),
            apellido_materno: body.apellido_materno.clone(),
            edad: body.edad.map(i64::from),
            email: body.email.clone(),
            fecha_nac: body.fecha_nac.clone(),
            datos: Some(WireDatos::Encoded(body.datos.clone())),
        }
    }

    /// Row as the store would keep it after an update.
    #[must_use]
    pub fn from_update(id: u64, body: &UpdateBody) -> Self {
        Self {
            id: Some(id),
            nombre: body.nombre.clone(),
            apellido_paterno: body.apellido_paterno.clone(),
            apellido_materno: body.apellido_materno.clone(),
            edad: body.edad.map(i64::from),
            email: body.email.clone(),
            fecha_nac: body.fecha_nac.clone(),
            datos: Some(WireDatos::Object(body.datos.clone())),
        }
    }
}

impl From<WireRecord> for Person {
    fn from(wire: WireRecord) -> Self {
        let address = wire
            .datos
            .map(WireDatos::into_address)
            .unwrap_or_default();
        Self {
            id: wire.id.map(RecordId),
            given_name: wire.nombre,
            paternal_surname: wire.apellido_paterno,
            maternal_surname: wire.apellido_materno,
            email: wire.email,
            birth_date: wire.fecha_nac,
            address: address.into(),
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
