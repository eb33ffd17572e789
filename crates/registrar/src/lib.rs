//! `registrar` - A console for registering people in a remote table
//!
//! This library provides person validation, photo capture and cropping, the
//! remote store client, and the registration and list/edit controllers the
//! `registrar` binary drives.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod form;
pub mod list;
pub mod logging;
pub mod notify;
pub mod photo;
pub mod record;
pub mod remote;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use form::{PersonForm, RegistrationForm, SubmitOutcome};
pub use list::{EditOutcome, FetchTicket, ListView};
pub use logging::init_logging;
pub use notify::{Notification, Notifier, Variant};
pub use photo::{capture_photo, CaptureDialog, CropBox, CropMode, PhotoSettings};
pub use record::{age_on, Address, Person, Photo, RecordId};
pub use remote::{HttpTransport, ListQuery, MemoryTransport, RecordClient, Transport};
pub use validation::{validate, Field, ValidationErrors};
