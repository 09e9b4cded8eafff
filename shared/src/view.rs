use serde::{Deserialize, Serialize};

use crate::model::{Coordinates, CropType, LocationState, Model, Platform};
use crate::{map_link, AppError};

pub const NO_FILE_NOTICE: &str = "No file selected";
pub const NO_CROP_NOTICE: &str = "Not selected";
pub const LOCATION_UNRESOLVED_TEXT: &str = "Location not requested";
pub const LOCATION_PENDING_TEXT: &str = "Locating...";
pub const LOCATION_DENIED_TEXT: &str =
    "Permission to access location was denied. Allow location access and try again.";
pub const LOCATION_SETTINGS_TEXT: &str =
    "Location access is turned off for this app. Enable it in Settings, then try again.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileView {
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub can_open: bool,
    pub can_remove: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CropView {
    pub selected: Option<String>,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationView {
    Unresolved,
    Pending,
    Resolved {
        latitude: f64,
        longitude: f64,
        text: String,
        map_url: Option<String>,
    },
    Denied {
        message: String,
        /// Retrying will not prompt again; the shell should offer a link to
        /// system settings.
        needs_settings: bool,
    },
    Failed {
        message: String,
        can_retry: bool,
    },
}

/// Read-only summary shown while the review is open.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewView {
    pub file_line: String,
    pub crop_line: String,
    pub location_line: String,
    /// Web shells render this as a link; native shells send
    /// `OpenMapRequested` instead.
    pub map_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub session_id: Option<String>,
    pub file: FileView,
    pub crop: CropView,
    pub location: LocationView,
    pub review: Option<ReviewView>,
    pub is_complete: bool,
    pub is_reviewable: bool,
    pub notice: Option<UserFacingError>,
}

fn map_url(model: &Model, coordinates: Coordinates) -> Option<String> {
    map_link(&model.config.map_base_url, coordinates)
        .ok()
        .map(String::from)
}

fn denied_text(needs_settings: bool) -> &'static str {
    if needs_settings {
        LOCATION_SETTINGS_TEXT
    } else {
        LOCATION_DENIED_TEXT
    }
}

fn location_view(model: &Model) -> LocationView {
    match model.session.location() {
        LocationState::Unresolved => LocationView::Unresolved,
        LocationState::Pending => LocationView::Pending,
        LocationState::Resolved(coordinates) => LocationView::Resolved {
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
            text: coordinates.to_string(),
            map_url: map_url(model, *coordinates),
        },
        LocationState::Denied { needs_settings } => LocationView::Denied {
            message: denied_text(*needs_settings).into(),
            needs_settings: *needs_settings,
        },
        LocationState::Failed(message) => LocationView::Failed {
            message: message.clone(),
            can_retry: true,
        },
    }
}

fn location_line(location: &LocationState) -> String {
    match location {
        LocationState::Unresolved => LOCATION_UNRESOLVED_TEXT.into(),
        LocationState::Pending => LOCATION_PENDING_TEXT.into(),
        LocationState::Resolved(coordinates) => coordinates.to_string(),
        LocationState::Denied { needs_settings } => denied_text(*needs_settings).into(),
        LocationState::Failed(message) => format!("Location unavailable: {message}"),
    }
}

fn review_view(model: &Model) -> ReviewView {
    let session = &model.session;
    let map_url = match (model.platform, session.location().coordinates()) {
        (Platform::Web, Some(coordinates)) => map_url(model, coordinates),
        _ => None,
    };

    ReviewView {
        file_line: session
            .selected_file()
            .map_or_else(|| NO_FILE_NOTICE.to_string(), |f| f.display_name().to_string()),
        crop_line: session
            .crop_type()
            .map_or_else(|| NO_CROP_NOTICE.to_string(), |c| c.label().to_string()),
        location_line: location_line(session.location()),
        map_url,
    }
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    let session = &model.session;
    let file = session.selected_file();

    ViewModel {
        session_id: model.session_id.map(|id| id.to_string()),
        file: FileView {
            display_name: file.map(|f| f.display_name().to_string()),
            mime_type: file.and_then(|f| f.mime_type().map(str::to_string)),
            can_open: file.is_some(),
            can_remove: file.is_some(),
        },
        crop: CropView {
            selected: session.crop_type().map(|c| c.label().to_string()),
            options: CropType::ALL.iter().map(|c| c.label().to_string()).collect(),
        },
        location: location_view(model),
        review: session.review_visible().then(|| review_view(model)),
        is_complete: session.is_complete(),
        is_reviewable: session.is_reviewable(),
        notice: model.active_error.as_ref().map(UserFacingError::from),
    }
}
