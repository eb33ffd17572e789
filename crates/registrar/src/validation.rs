//! Field validation rules for person records.
//!
//! Rules are pure: they look at a [`Person`] and the date to treat as
//! "today", and never touch the network or the camera. Every field is
//! checked and each failing field reports the first rule it broke.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use registrar::validation::{validate, Field};
//! use registrar::Person;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let errors = validate(&Person::default(), today).unwrap_err();
//! assert_eq!(errors.get(Field::GivenName), Some("Given name is required"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::record::{Person, DATE_FORMAT};

static NAME_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúñÑ\s]+$").expect("Invalid regex pattern"));

static STREET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúñÑ0-9\s-]+$").expect("Invalid regex pattern")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("Invalid regex pattern"));

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("Invalid regex pattern"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Invalid regex pattern")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex pattern"));

/// A validated field of a person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Given name.
    GivenName,
    /// Paternal surname.
    PaternalSurname,
    /// Maternal surname.
    MaternalSurname,
    /// Email address.
    Email,
    /// Birth date.
    BirthDate,
    /// Address street.
    Street,
    /// Address exterior number.
    ExteriorNumber,
    /// Address neighborhood.
    Neighborhood,
    /// Address municipality or borough.
    Municipality,
    /// Address state or province.
    State,
    /// Address postal code.
    PostalCode,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Field; 11] = [
        Field::GivenName,
        Field::PaternalSurname,
        Field::MaternalSurname,
        Field::Email,
        Field::BirthDate,
        Field::Street,
        Field::ExteriorNumber,
        Field::Neighborhood,
        Field::Municipality,
        Field::State,
        Field::PostalCode,
    ];

    /// Dotted path of the field within a record.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::GivenName => "given_name",
            Self::PaternalSurname => "paternal_surname",
            Self::MaternalSurname => "maternal_surname",
            Self::Email => "email",
            Self::BirthDate => "birth_date",
            Self::Street => "address.street",
            Self::ExteriorNumber => "address.exterior_number",
            Self::Neighborhood => "address.neighborhood",
            Self::Municipality => "address.municipality",
            Self::State => "address.state",
            Self::PostalCode => "address.postal_code",
        }
    }

    /// Label shown next to the field.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::GivenName => "Given name",
            Self::PaternalSurname => "Paternal surname",
            Self::MaternalSurname => "Maternal surname",
            Self::Email => "Email",
            Self::BirthDate => "Birth date",
            Self::Street => "Street",
            Self::ExteriorNumber => "Exterior number",
            Self::Neighborhood => "Neighborhood",
            Self::Municipality => "Municipality",
            Self::State => "State",
            Self::PostalCode => "Postal code",
        }
    }

    /// The field's current text in `person`.
    #[must_use]
    pub fn value(self, person: &Person) -> &str {
        match self {
            Self::GivenName => &person.given_name,
            Self::PaternalSurname => &person.paternal_surname,
            Self::MaternalSurname => &person.maternal_surname,
            Self::Email => &person.email,
            Self::BirthDate => &person.birth_date,
            Self::Street => &person.address.street,
            Self::ExteriorNumber => &person.address.exterior_number,
            Self::Neighborhood => &person.address.neighborhood,
            Self::Municipality => &person.address.municipality,
            Self::State => &person.address.state,
            Self::PostalCode => &person.address.postal_code,
        }
    }

    /// Mutable access to the field's text in `person`.
    pub fn value_mut(self, person: &mut Person) -> &mut String {
        match self {
            Self::GivenName => &mut person.given_name,
            Self::PaternalSurname => &mut person.paternal_surname,
            Self::MaternalSurname => &mut person.maternal_surname,
            Self::Email => &mut person.email,
            Self::BirthDate => &mut person.birth_date,
            Self::Street => &mut person.address.street,
            Self::ExteriorNumber => &mut person.address.exterior_number,
            Self::Neighborhood => &mut person.address.neighborhood,
            Self::Municipality => &mut person.address.municipality,
            Self::State => &mut person.address.state,
            Self::PostalCode => &mut person.address.postal_code,
        }
    }

    fn pattern(self) -> Option<(&'static Regex, &'static str)> {
        let (regex, message) = match self {
            Self::GivenName => (&NAME_LIKE, "Only letters are allowed in the given name"),
            Self::PaternalSurname => (
                &NAME_LIKE,
                "Only letters are allowed in the paternal surname",
            ),
            Self::MaternalSurname => (
                &NAME_LIKE,
                "Only letters are allowed in the maternal surname",
            ),
            Self::Email => (&EMAIL, "Invalid email format"),
            Self::Street => (&STREET, "Only letters and numbers are allowed in the street"),
            Self::ExteriorNumber => (&DIGITS, "Only digits are allowed"),
            Self::State => (&NAME_LIKE, "Only letters are allowed in the state"),
            Self::PostalCode => (&POSTAL_CODE, "Postal code must be exactly 5 digits"),
            Self::BirthDate | Self::Neighborhood | Self::Municipality => return None,
        };
        Some((LazyLock::force(regex), message))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.path() == s || field.path().strip_prefix("address.") == Some(s))
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Field-level errors from a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    /// Record an error for `field`, replacing any previous one.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// The error for `field`, if any.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The failing fields, in form order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// Failing fields with their messages, in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// Drop the error for `field`.
    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {field}: {message}")?;
        }
        Ok(())
    }
}

/// Validate every field of `person`.
///
/// # Errors
///
/// Returns the failing fields and their messages when any rule is broken.
pub fn validate(person: &Person, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for field in Field::ALL {
        if let Some(message) = validate_field(field, person, today) {
            errors.insert(field, message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a single field, returning the first broken rule's message.
#[must_use]
pub fn validate_field(field: Field, person: &Person, today: NaiveDate) -> Option<String> {
    let value = field.value(person);
    if value.trim().is_empty() {
        return Some(format!("{} is required", field.label()));
    }

    if field == Field::BirthDate {
        return check_birth_date(value, today).map(str::to_string);
    }

    match field.pattern() {
        Some((regex, message)) if !regex.is_match(value) => Some(message.to_string()),
        _ => None,
    }
}

fn check_birth_date(value: &str, today: NaiveDate) -> Option<&'static str> {
    if !ISO_DATE.is_match(value) {
        return Some("Format must be YYYY-MM-DD");
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Err(_) => Some("Not a valid calendar date"),
        Ok(born) if born > today => Some("Birth date must not be in the future"),
        Ok(_) => None,
    }
}
