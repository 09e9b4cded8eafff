use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

use crate::capabilities::FilePickerError;
use crate::config::IntakeConfig;
use crate::AppError;

// --- Session identity ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// --- Platform ---

/// Reported once by the shell on screen entry. Web shells have no separate
/// permission step: the browser prompts as part of the position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Native,
    Web,
}

impl Platform {
    #[must_use]
    pub const fn requires_permission_grant(self) -> bool {
        matches!(self, Self::Native)
    }
}

// --- Crop type ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropType {
    Maize,
    Sugarcane,
    Cotton,
    Tobacco,
    Paddy,
    Barley,
    Wheat,
    Millets,
    #[serde(rename = "Oil seeds")]
    OilSeeds,
    Pulses,
    #[serde(rename = "Ground Nuts")]
    GroundNuts,
}

impl CropType {
    /// Catalog order as presented by the picker.
    pub const ALL: [CropType; 11] = [
        Self::Maize,
        Self::Sugarcane,
        Self::Cotton,
        Self::Tobacco,
        Self::Paddy,
        Self::Barley,
        Self::Wheat,
        Self::Millets,
        Self::OilSeeds,
        Self::Pulses,
        Self::GroundNuts,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Maize => "Maize",
            Self::Sugarcane => "Sugarcane",
            Self::Cotton => "Cotton",
            Self::Tobacco => "Tobacco",
            Self::Paddy => "Paddy",
            Self::Barley => "Barley",
            Self::Wheat => "Wheat",
            Self::Millets => "Millets",
            Self::OilSeeds => "Oil seeds",
            Self::Pulses => "Pulses",
            Self::GroundNuts => "Ground Nuts",
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crop type: {0:?}")]
pub struct CropTypeError(pub String);

impl FromStr for CropType {
    type Err = CropTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|crop| crop.label() == s)
            .ok_or_else(|| CropTypeError(s.to_string()))
    }
}

// --- File descriptor ---

/// A picked soil report. Only constructible fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    uri: String,
    display_name: String,
    mime_type: Option<String>,
}

impl FileDescriptor {
    /// Builds a descriptor from whatever the picker reported. A blank name
    /// falls back to the last path segment of the URI; a blank MIME type
    /// becomes `None`.
    pub fn new(
        uri: impl Into<String>,
        display_name: impl Into<String>,
        mime_type: Option<String>,
    ) -> Result<Self, FilePickerError> {
        let uri = uri.into().trim().to_string();
        if uri.is_empty() {
            return Err(FilePickerError::InvalidDocument {
                reason: "document uri is empty".into(),
            });
        }

        let display_name = display_name.into().trim().to_string();
        let display_name = if display_name.is_empty() {
            name_from_uri(&uri).ok_or_else(|| FilePickerError::InvalidDocument {
                reason: "document has no name".into(),
            })?
        } else {
            display_name
        };

        let mime_type = mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Ok(Self {
            uri,
            display_name,
            mime_type,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

fn name_from_uri(uri: &str) -> Option<String> {
    let segment = match url::Url::parse(uri) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        // Bare filesystem paths from older pickers.
        Err(_) => uri.rsplit(['/', '\\']).next().map(str::to_string),
    }?;

    let segment = segment.trim().to_string();
    (!segment.is_empty()).then_some(segment)
}

// --- Coordinates ---

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

// --- Location state ---

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationState {
    #[default]
    Unresolved,
    Pending,
    Resolved(Coordinates),
    /// `needs_settings` is set when the platform will not prompt again and
    /// access has to be granted from system settings.
    Denied { needs_settings: bool },
    Failed(String),
}

impl LocationState {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Denied { .. } | Self::Failed(_))
    }

    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved(coordinates) => Some(*coordinates),
            _ => None,
        }
    }
}

// --- Acquisition attempts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues attempt ids for one acquisition kind and remembers which one is
/// still allowed to land. Ids are never reused, including across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptTracker {
    issued: u64,
    current: Option<AttemptId>,
}

impl AttemptTracker {
    /// Starts a new attempt, superseding any attempt still in flight.
    pub fn begin(&mut self) -> AttemptId {
        self.issued += 1;
        let id = AttemptId(self.issued);
        self.current = Some(id);
        id
    }

    #[must_use]
    pub fn is_current(&self, id: AttemptId) -> bool {
        self.current == Some(id)
    }

    /// Accepts the terminal result of `id`. Returns `false` for superseded
    /// or already-finished attempts, whose results must be dropped.
    pub fn finish(&mut self, id: AttemptId) -> bool {
        if self.is_current(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

// --- Session ---

/// Inputs collected during one screen visit. Only the app's update loop
/// mutates it; shells observe it through the view model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    selected_file: Option<FileDescriptor>,
    crop_type: Option<CropType>,
    location: LocationState,
    review_visible: bool,
}

impl Session {
    pub fn selected_file(&self) -> Option<&FileDescriptor> {
        self.selected_file.as_ref()
    }

    pub fn crop_type(&self) -> Option<CropType> {
        self.crop_type
    }

    pub fn location(&self) -> &LocationState {
        &self.location
    }

    pub fn review_visible(&self) -> bool {
        self.review_visible
    }

    /// Review is informational and never gated.
    pub fn is_reviewable(&self) -> bool {
        true
    }

    pub fn is_complete(&self) -> bool {
        self.selected_file.is_some()
            && self.crop_type.is_some()
            && matches!(self.location, LocationState::Resolved(_))
    }

    pub(crate) fn set_file(&mut self, file: FileDescriptor) {
        self.selected_file = Some(file);
    }

    pub(crate) fn remove_file(&mut self) {
        self.selected_file = None;
    }

    pub(crate) fn select_crop(&mut self, crop: CropType) {
        self.crop_type = Some(crop);
    }

    pub(crate) fn begin_location_attempt(&mut self) {
        self.location = LocationState::Pending;
    }

    /// Records the outcome of the in-flight attempt. Ignored unless the
    /// state is Pending and `outcome` is terminal.
    pub(crate) fn settle_location(&mut self, outcome: LocationState) -> bool {
        if !self.location.is_pending() || !outcome.is_terminal() {
            return false;
        }
        self.location = outcome;
        true
    }

    pub(crate) fn show_review(&mut self) {
        self.review_visible = true;
    }

    pub(crate) fn hide_review(&mut self) {
        self.review_visible = false;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

// --- Model ---

#[derive(Debug, Default)]
pub struct Model {
    pub(crate) session_id: Option<SessionId>,
    pub(crate) session: Session,
    pub(crate) platform: Platform,
    pub(crate) config: IntakeConfig,
    pub(crate) file_attempts: AttemptTracker,
    pub(crate) location_attempts: AttemptTracker,
    pub(crate) open_attempts: AttemptTracker,
    pub(crate) active_error: Option<AppError>,
}

impl Model {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn active_error(&self) -> Option<&AppError> {
        self.active_error.as_ref()
    }

    pub(crate) fn begin_session(&mut self, platform: Platform, config: IntakeConfig) {
        self.end_session();
        self.session_id = Some(SessionId::generate());
        self.platform = platform;
        self.config = config;
    }

    /// Drops the session and supersedes whatever is still in flight.
    pub(crate) fn end_session(&mut self) {
        self.session_id = None;
        self.reset_inputs();
    }

    /// Clears every input but keeps the session identity and settings.
    pub(crate) fn reset_inputs(&mut self) {
        self.session.reset();
        self.file_attempts.invalidate();
        self.location_attempts.invalidate();
        self.open_attempts.invalidate();
        self.active_error = None;
    }

    pub(crate) fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub(crate) fn clear_error_if(&mut self, predicate: impl FnOnce(&AppError) -> bool) {
        if self.active_error.as_ref().is_some_and(predicate) {
            self.active_error = None;
        }
    }
}
