use serde::{Deserialize, Serialize};

use crate::capabilities::{FilePickerResult, GeolocationResult, OpenTarget, OpenerResult};
use crate::config::IntakeConfig;
use crate::model::{AttemptId, Platform};

/// Which kind of thing an `OpenCompleted` response refers to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenKind {
    Document,
    Map,
}

impl From<&OpenTarget> for OpenKind {
    fn from(target: &OpenTarget) -> Self {
        if target.is_document() {
            Self::Document
        } else {
            Self::Map
        }
    }
}

// Response variants are produced by capabilities inside the core and never
// cross the FFI boundary, so they are skipped by serde.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // Screen lifecycle
    ScreenEntered {
        platform: Platform,
        #[serde(default)]
        config: IntakeConfig,
    },
    ScreenExited,

    // Soil report
    FileRequested,
    FileRemoved,
    OpenFileRequested,

    // Crop
    CropSelected {
        value: String,
    },

    // Location
    LocationRequested,
    OpenMapRequested,

    // Review
    ReviewShown,
    ReviewHidden,
    ResetRequested,
    NoticeDismissed,

    // Capability responses (boxed to keep enum size small)
    #[serde(skip)]
    FilePicked {
        attempt: AttemptId,
        result: Box<FilePickerResult>,
    },
    #[serde(skip)]
    LocationPermissionChecked {
        attempt: AttemptId,
        result: Box<GeolocationResult>,
    },
    #[serde(skip)]
    LocationPermissionRequested {
        attempt: AttemptId,
        result: Box<GeolocationResult>,
    },
    #[serde(skip)]
    PositionReceived {
        attempt: AttemptId,
        result: Box<GeolocationResult>,
    },
    #[serde(skip)]
    OpenCompleted {
        attempt: AttemptId,
        kind: OpenKind,
        result: Box<OpenerResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ScreenEntered { .. } => "screen_entered",
            Self::ScreenExited => "screen_exited",
            Self::FileRequested => "file_requested",
            Self::FileRemoved => "file_removed",
            Self::OpenFileRequested => "open_file_requested",
            Self::CropSelected { .. } => "crop_selected",
            Self::LocationRequested => "location_requested",
            Self::OpenMapRequested => "open_map_requested",
            Self::ReviewShown => "review_shown",
            Self::ReviewHidden => "review_hidden",
            Self::ResetRequested => "reset_requested",
            Self::NoticeDismissed => "notice_dismissed",
            Self::FilePicked { .. } => "file_picked",
            Self::LocationPermissionChecked { .. } => "location_permission_checked",
            Self::LocationPermissionRequested { .. } => "location_permission_requested",
            Self::PositionReceived { .. } => "position_received",
            Self::OpenCompleted { .. } => "open_completed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::FileRequested
                | Self::FileRemoved
                | Self::OpenFileRequested
                | Self::CropSelected { .. }
                | Self::LocationRequested
                | Self::OpenMapRequested
                | Self::ReviewShown
                | Self::ReviewHidden
                | Self::ResetRequested
                | Self::NoticeDismissed
        )
    }
}
