//! Person records.
//!
//! A [`Person`] is built in memory by a form, gets its [`RecordId`] from the
//! remote store on creation, and keeps it through later edits. Fields hold
//! the text the user typed; anything derived from them (age, numeric postal
//! code) is computed on demand and never taken as input.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Date format used for birth dates, on screen and on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Prefix of PNG data URLs produced by the capture dialog.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Identity assigned by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// An encoded still image.
///
/// Holds either a full data URL or a bare base64 payload, whichever the
/// remote store handed back.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Photo(String);

impl Photo {
    /// Wrap encoded photo text as stored remotely.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Build a photo from raw PNG bytes.
    #[must_use]
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes)))
    }

    /// The encoded text exactly as held.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether there is no image data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decode the image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PhotoDecode`] when the payload is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = match self.0.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => self.0.as_str(),
        };
        STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::PhotoDecode(e.to_string()))
    }

    /// Short digest identifying the photo in logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes()).to_hex();
        hash[..16].to_string()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("len", &self.0.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Postal address of a person, plus their photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Street name.
    pub street: String,
    /// Exterior (street) number.
    pub exterior_number: String,
    /// Neighborhood.
    pub neighborhood: String,
    /// Municipality or borough.
    pub municipality: String,
    /// State or province.
    pub state: String,
    /// Five-digit postal code, as typed.
    pub postal_code: String,
    /// Captured photo. Optional here, mandatory on submit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

impl Address {
    /// Numeric form of the postal code, if it is all digits.
    #[must_use]
    pub fn postal_code_number(&self) -> Option<u32> {
        let code = self.postal_code.trim();
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        code.parse().ok()
    }

    /// Whether a non-empty photo is attached.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// One person entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Identity from the remote store; `None` until created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Given name.
    pub given_name: String,
    /// Paternal surname (the searchable one).
    pub paternal_surname: String,
    /// Maternal surname.
    pub maternal_surname: String,
    /// Email address.
    pub email: String,
    /// Birth date as `YYYY-MM-DD` text.
    pub birth_date: String,
    /// Address and photo.
    pub address: Address,
}

impl Person {
    /// Parse the birth date, if it is a valid `YYYY-MM-DD` date.
    #[must_use]
    pub fn parsed_birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.birth_date.trim(), DATE_FORMAT).ok()
    }

    /// Age as of `today`, or `None` when the birth date does not parse.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.parsed_birth_date().map(|born| age_on(born, today))
    }

    /// Full name for display: given name then both surnames.
    #[must_use]
    pub fn full_name(&self) -> String {
        [
            self.given_name.trim(),
            self.paternal_surname.trim(),
            self.maternal_surname.trim(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Derived age: the calendar-year difference between `today` and `born`.
///
/// Month and day are ignored.
#[must_use]
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - born.year()
}

/// Today's date in local time.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_age_is_year_difference() {
        assert_eq!(age_on(date("1990-12-31"), date("2024-01-01")), 34);
        assert_eq!(age_on(date("1990-01-01"), date("2024-12-31")), 34);
        assert_eq!(age_on(date("2024-05-05"), date("2024-05-05")), 0);
    }

    #[test]
    fn test_person_age_requires_parsable_date() {
        let mut person = Person {
            birth_date: "1985-07-20".to_string(),
            ..Default::default()
        };
        assert_eq!(person.age_on(date("2025-01-01")), Some(40));

        person.birth_date = "20/07/1985".to_string();
        assert_eq!(person.age_on(date("2025-01-01")), None);
    }

    #[test]
    fn test_postal_code_number() {
        let mut address = Address {
            postal_code: "12345".to_string(),
            ..Default::default()
        };
        assert_eq!(address.postal_code_number(), Some(12345));

        address.postal_code = "01020".to_string();
        assert_eq!(address.postal_code_number(), Some(1020));

        address.postal_code = "12a45".to_string();
        assert_eq!(address.postal_code_number(), None);

        address.postal_code = String::new();
        assert_eq!(address.postal_code_number(), None);
    }

    #[test]
    fn test_has_photo() {
        let mut address = Address::default();
        assert!(!address.has_photo());

        address.photo = Some(Photo::new(""));
        assert!(!address.has_photo());

        address.photo = Some(Photo::from_png_bytes(b"png"));
        assert!(address.has_photo());
    }

    #[test]
    fn test_photo_data_url() {
        let photo = Photo::from_png_bytes(&[1, 2, 3]);
        assert!(photo.as_str().starts_with(PNG_DATA_URL_PREFIX));
        assert!(photo.as_str().ends_with("AQID"));
    }

    #[test]
    fn test_photo_decode_accepts_both_forms() {
        let photo = Photo::from_png_bytes(&[1, 2, 3]);
        assert_eq!(photo.decode().unwrap(), vec![1, 2, 3]);

        let bare = Photo::new("AQID");
        assert_eq!(bare.decode().unwrap(), vec![1, 2, 3]);

        let broken = Photo::new("data:image/png;base64,@@@");
        assert!(matches!(broken.decode(), Err(Error::PhotoDecode(_))));
    }

    #[test]
    fn test_photo_debug_hides_payload() {
        let photo = Photo::from_png_bytes(&[9; 64]);
        let debug = format!("{photo:?}");
        assert!(debug.contains("fingerprint"));
        assert!(!debug.contains("base64"));
        assert_eq!(photo.fingerprint().len(), 16);
    }

    #[test]
    fn test_record_id_parse_and_display() {
        let id: RecordId = " 42 ".parse().unwrap();
        assert_eq!(id, RecordId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_full_name() {
        let person = Person {
            given_name: "Ana".to_string(),
            paternal_surname: "García".to_string(),
            maternal_surname: "López".to_string(),
            ..Default::default()
        };
        assert_eq!(person.full_name(), "Ana García López");
    }

    #[test]
    fn test_person_serialization_skips_missing_id() {
        let person = Person::default();
        let json = serde_json::to_string(&person).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("given_name"));
    }
}
