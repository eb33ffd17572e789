//! Person form and the registration flow built on it.

use chrono::NaiveDate;
use registrar_camera::{check_permission, CameraDevice, PermissionStatus};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::notify::{Notifier, CAMERA_DENIED, PERSON_CREATED, PHOTO_REQUIRED};
use crate::record::{Person, Photo, RecordId};
use crate::remote::{RecordClient, Transport};
use crate::validation::{validate, Field, ValidationErrors};

/// A draft person plus the errors from its last check.
#[derive(Debug, Clone, Default)]
pub struct PersonForm {
    draft: Person,
    errors: ValidationErrors,
}

impl PersonForm {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from an existing person.
    #[must_use]
    pub fn from_person(person: Person) -> Self {
        Self {
            draft: person,
            errors: ValidationErrors::default(),
        }
    }

    /// The draft.
    #[must_use]
    pub fn person(&self) -> &Person {
        &self.draft
    }

    /// Identity of the person being edited, if any.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.draft.id
    }

    /// Set a field. Any error shown for it is cleared until the next check.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *field.value_mut(&mut self.draft) = value.into();
        self.errors.remove(field);
    }

    /// Attach a captured photo.
    pub fn attach_photo(&mut self, photo: Photo) {
        debug!(fingerprint = %photo.fingerprint(), "Photo attached to form");
        self.draft.address.photo = Some(photo);
    }

    /// Remove the photo.
    pub fn clear_photo(&mut self) {
        self.draft.address.photo = None;
    }

    /// Whether a photo is attached.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.draft.address.has_photo()
    }

    /// Errors from the last check.
    #[must_use]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validate every field, then require a photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with every failing field, or
    /// [`Error::MissingPhoto`] when the fields pass but no photo is attached.
    pub fn check(&mut self, today: NaiveDate) -> Result<()> {
        match validate(&self.draft, today) {
            Ok(()) => self.errors = ValidationErrors::default(),
            Err(errors) => {
                self.errors = errors.clone();
                return Err(Error::Validation(errors));
            }
        }
        if !self.has_photo() {
            return Err(Error::MissingPhoto);
        }
        Ok(())
    }

    /// Clear the draft, photo and errors.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of one submit.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Field errors; nothing was sent.
    Invalid(ValidationErrors),
    /// Fields were fine but no photo; nothing was sent.
    MissingPhoto,
    /// Stored remotely; the form has been reset.
    Created(Person),
    /// The store failed; the form keeps its contents.
    Failed(Error),
}

impl SubmitOutcome {
    /// Classify a check or remote failure.
    pub(crate) fn from_error(err: Error) -> Self {
        match err {
            Error::Validation(errors) => Self::Invalid(errors),
            Error::MissingPhoto => Self::MissingPhoto,
            other => Self::Failed(other),
        }
    }
}

/// The registration screen: one form that creates new people.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    form: PersonForm,
}

impl RegistrationForm {
    /// A blank registration form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying form.
    #[must_use]
    pub fn form(&self) -> &PersonForm {
        &self.form
    }

    /// Mutable access to the underlying form.
    pub fn form_mut(&mut self) -> &mut PersonForm {
        &mut self.form
    }

    /// Report camera availability, warning the user when it is refused.
    /// The form stays usable either way.
    pub async fn check_camera(
        &self,
        camera: &dyn CameraDevice,
        notifier: &mut Notifier,
    ) -> PermissionStatus {
        let status = check_permission(camera).await;
        if !status.is_granted {
            notifier.warning(CAMERA_DENIED);
        }
        status
    }

    /// Validate, require a photo, and create the person remotely.
    #[instrument(skip_all)]
    pub async fn submit<T: Transport>(
        &mut self,
        client: &RecordClient<T>,
        notifier: &mut Notifier,
        today: NaiveDate,
    ) -> SubmitOutcome {
        if let Err(err) = self.form.check(today) {
            if matches!(err, Error::MissingPhoto) {
                notifier.danger(PHOTO_REQUIRED);
            }
            debug!(error = %err, "Submit blocked");
            return SubmitOutcome::from_error(err);
        }

        match client.create(self.form.person(), today).await {
            Ok(created) => {
                info!(id = ?created.id, "Registration submitted");
                notifier.success(PERSON_CREATED);
                self.form.reset();
                SubmitOutcome::Created(created)
            }
            Err(err) => {
                notifier.danger(err.display_message());
                SubmitOutcome::from_error(err)
            }
        }
    }
}
