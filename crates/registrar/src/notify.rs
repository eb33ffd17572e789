//! Transient user notifications.
//!
//! A notification is shown until its lifetime runs out. Posting also logs the
//! message, so a run without a terminal still leaves a trace.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

/// Shown when a record is submitted without a photo.
pub const PHOTO_REQUIRED: &str = "Photo is required";
/// Shown after a successful create.
pub const PERSON_CREATED: &str = "Person created successfully";
/// Shown after a successful update.
pub const PERSON_UPDATED: &str = "Person updated successfully";
/// Shown when the camera cannot be used.
pub const CAMERA_DENIED: &str = "Camera permission denied; photo capture is unavailable";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Something worked.
    Success,
    /// Something failed and the user must act.
    Danger,
    /// Degraded but usable.
    Warning,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Danger => write!(f, "danger"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A posted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub variant: Variant,
    /// Text shown to the user.
    pub message: String,
    /// When it was posted.
    pub posted_at: Instant,
}

impl Notification {
    /// Whether the notification is still visible at `now`.
    #[must_use]
    pub fn is_visible_at(&self, now: Instant, lifetime: Duration) -> bool {
        now.saturating_duration_since(self.posted_at) < lifetime
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.variant, self.message)
    }
}

/// Queue of notifications with automatic expiry.
#[derive(Debug)]
pub struct Notifier {
    lifetime: Duration,
    queue: VecDeque<Notification>,
}

impl Notifier {
    /// A notifier whose messages stay visible for `lifetime`.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            queue: VecDeque::new(),
        }
    }

    /// Post a notification.
    pub fn post(&mut self, variant: Variant, message: impl Into<String>) {
        let message = message.into();
        match variant {
            Variant::Success => info!(%message, "Notification"),
            Variant::Warning => warn!(%message, "Notification"),
            Variant::Danger => error!(%message, "Notification"),
        }
        self.queue.push_back(Notification {
            variant,
            message,
            posted_at: Instant::now(),
        });
    }

    /// Post a success notification.
    pub fn success(&mut self, message: impl Into<String>) {
        self.post(Variant::Success, message);
    }

    /// Post a danger notification.
    pub fn danger(&mut self, message: impl Into<String>) {
        self.post(Variant::Danger, message);
    }

    /// Post a warning notification.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.post(Variant::Warning, message);
    }

    /// Drop expired notifications and return the rest, oldest first.
    pub fn visible(&mut self) -> impl Iterator<Item = &Notification> {
        let now = Instant::now();
        let lifetime = self.lifetime;
        self.queue.retain(|n| n.is_visible_at(now, lifetime));
        self.queue.iter()
    }

    /// Take every pending notification, expired or not.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    /// The most recent notification, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }

    /// Number of pending notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(5_000))
    }
}
