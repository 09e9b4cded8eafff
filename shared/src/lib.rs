#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capabilities::FilePickerError;
use crate::config::ConfigError;
use crate::model::{Coordinates, CropTypeError};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::IntakeConfig;
pub use event::Event;
pub use model::{Model, Platform};
pub use view::{UserFacingError, ViewModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UserCancelled,
    LocationPermissionDenied,
    FileAcquisition,
    LocationAcquisition,
    InvalidInput,
    FileOpenUnavailable,
    MapUnavailable,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserCancelled => "USER_CANCELLED",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::FileAcquisition => "FILE_ACQUISITION_FAILED",
            Self::LocationAcquisition => "LOCATION_ACQUISITION_FAILED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::FileOpenUnavailable => "FILE_OPEN_UNAVAILABLE",
            Self::MapUnavailable => "MAP_UNAVAILABLE",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }

    /// Everything the user can fix by trying again from the same screen.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::LocationPermissionDenied
                | Self::FileAcquisition
                | Self::LocationAcquisition
                | Self::FileOpenUnavailable
                | Self::MapUnavailable
        )
    }

    /// Cancellations, wiring defects and config fallbacks are logged only.
    #[must_use]
    pub const fn is_user_visible(self) -> bool {
        !matches!(
            self,
            Self::UserCancelled | Self::InvalidInput | Self::Configuration
        )
    }

    #[must_use]
    pub const fn is_location(self) -> bool {
        matches!(
            self,
            Self::LocationPermissionDenied | Self::LocationAcquisition | Self::MapUnavailable
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        self.kind.is_user_visible()
    }

    #[must_use]
    pub const fn is_location_error(&self) -> bool {
        self.kind.is_location()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::UserCancelled => "Selection cancelled.".into(),
            ErrorKind::LocationPermissionDenied => {
                "Location access was denied. Allow location access and try again.".into()
            }
            ErrorKind::FileAcquisition => {
                format!("Could not select the soil report: {}", self.message)
            }
            ErrorKind::LocationAcquisition => {
                format!("Could not get your location: {}", self.message)
            }
            ErrorKind::InvalidInput
            | ErrorKind::FileOpenUnavailable
            | ErrorKind::MapUnavailable => self.message.clone(),
            ErrorKind::Configuration => {
                "Screen settings were invalid. Default settings are in use.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<FilePickerError> for AppError {
    fn from(e: FilePickerError) -> Self {
        let kind = match e {
            FilePickerError::Cancelled => ErrorKind::UserCancelled,
            _ => ErrorKind::FileAcquisition,
        };
        Self::new(kind, e.to_string()).with_context("retryable", e.is_retryable().to_string())
    }
}

impl From<CropTypeError> for AppError {
    fn from(e: CropTypeError) -> Self {
        Self::new(ErrorKind::InvalidInput, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorKind::Configuration, "invalid intake config").with_internal(e.to_string())
    }
}

/// Builds `{base}?q={lat},{lon}`, the link format used by map search pages.
/// Any query already on `base` is replaced.
pub fn map_link(base: &str, coordinates: Coordinates) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(base)?;
    url.set_query(Some(&format!(
        "q={},{}",
        coordinates.latitude(),
        coordinates.longitude()
    )));
    Ok(url)
}

pub mod app {
    use tracing::{debug, info, warn};

    use crate::capabilities::{
        normalize_pick, Capabilities, GeolocationResult, OpenTarget, PickOutcome,
    };
    use crate::config::IntakeConfig;
    use crate::event::{Event, OpenKind};
    use crate::model::{AttemptId, Coordinates, CropType, LocationState, Model};
    use crate::view::{self, ViewModel, NO_FILE_NOTICE};
    use crate::{map_link, AppError, ErrorKind};

    const UNEXPECTED_GEOLOCATION_OUTPUT: &str = "unexpected response from location service";
    const INVALID_POSITION: &str = "device reported an invalid position";

    #[derive(Default)]
    pub struct App;

    impl App {
        /// Starts a location attempt, superseding any attempt in flight.
        /// Native shells go through the permission check first; web shells
        /// let the browser prompt as part of the position request.
        fn start_location_attempt(model: &mut Model, caps: &Capabilities) {
            let attempt = model.location_attempts.begin();
            model.session.begin_location_attempt();
            debug!(%attempt, platform = ?model.platform, "location attempt started");

            if model.platform.requires_permission_grant() {
                caps.geolocation.check_permission(move |result| {
                    Event::LocationPermissionChecked {
                        attempt,
                        result: Box::new(result),
                    }
                });
            } else {
                Self::request_position(attempt, model, caps);
            }
        }

        fn request_position(attempt: AttemptId, model: &Model, caps: &Capabilities) {
            caps.geolocation
                .current_position(model.config.position_options(), move |result| {
                    Event::PositionReceived {
                        attempt,
                        result: Box::new(result),
                    }
                });
        }

        fn request_permission(attempt: AttemptId, caps: &Capabilities) {
            caps.geolocation.request_permission(move |result| {
                Event::LocationPermissionRequested {
                    attempt,
                    result: Box::new(result),
                }
            });
        }

        fn position_outcome(result: GeolocationResult) -> LocationState {
            match result {
                Ok(output) => match output.into_position() {
                    Some(position) => match Coordinates::new(position.latitude, position.longitude)
                    {
                        Ok(coordinates) => LocationState::Resolved(coordinates),
                        Err(_) => LocationState::Failed(INVALID_POSITION.into()),
                    },
                    None => LocationState::Failed(UNEXPECTED_GEOLOCATION_OUTPUT.into()),
                },
                // Browsers report a refused prompt as an error of the position call.
                Err(e) if e.is_permission_error() => LocationState::Denied {
                    needs_settings: false,
                },
                Err(e) => LocationState::Failed(e.to_string()),
            }
        }

        /// Applies the terminal outcome of `attempt` if it is still the
        /// current one. Superseded results are dropped.
        fn settle_location(
            model: &mut Model,
            caps: &Capabilities,
            attempt: AttemptId,
            outcome: LocationState,
        ) {
            if !model.location_attempts.finish(attempt) {
                debug!(%attempt, "discarding superseded location result");
                return;
            }

            match &outcome {
                LocationState::Resolved(_) => {
                    info!(%attempt, "location resolved");
                    model.clear_error_if(AppError::is_location_error);
                }
                LocationState::Denied { needs_settings } => {
                    info!(%attempt, needs_settings, "location permission denied");
                    model.set_error(AppError::new(
                        ErrorKind::LocationPermissionDenied,
                        "location permission denied",
                    ));
                }
                LocationState::Failed(reason) => {
                    warn!(%attempt, %reason, "location acquisition failed");
                    model.set_error(AppError::new(ErrorKind::LocationAcquisition, reason.clone()));
                }
                LocationState::Unresolved | LocationState::Pending => {}
            }

            model.session.settle_location(outcome);
            caps.render.render();
        }

        fn open(target: OpenTarget, model: &mut Model, caps: &Capabilities) {
            let kind = OpenKind::from(&target);
            let attempt = model.open_attempts.begin();
            debug!(%attempt, ?kind, "open requested");
            caps.opener.open(target, move |result| Event::OpenCompleted {
                attempt,
                kind,
                result: Box::new(result),
            });
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let span = tracing::debug_span!(
                "update",
                event = event.name(),
                session = model.session_id.map(tracing::field::display),
            );
            let _entered = span.enter();

            if event.is_user_initiated() {
                debug!("user action");
            }

            match event {
                Event::ScreenEntered { platform, config } => {
                    let config = match config.validate() {
                        Ok(()) => config,
                        Err(e) => {
                            let error = AppError::from(e);
                            warn!(code = error.code(), %error, "falling back to default config");
                            IntakeConfig::default()
                        }
                    };

                    model.begin_session(platform, config);
                    info!(
                        session = model.session_id.map(tracing::field::display),
                        ?platform,
                        "intake session started"
                    );

                    if model.config.locate_on_enter {
                        Self::start_location_attempt(model, caps);
                    }
                    caps.render.render();
                }

                Event::ScreenExited => {
                    model.end_session();
                    info!("intake session ended");
                    caps.render.render();
                }

                Event::FileRequested => {
                    let attempt = model.file_attempts.begin();
                    debug!(%attempt, "file pick started");
                    caps.file_picker
                        .pick_document(model.config.pick_config(), move |result| {
                            Event::FilePicked {
                                attempt,
                                result: Box::new(result),
                            }
                        });
                }

                Event::FilePicked { attempt, result } => {
                    if !model.file_attempts.finish(attempt) {
                        debug!(%attempt, "discarding superseded file pick");
                        return;
                    }

                    match normalize_pick(*result) {
                        PickOutcome::Picked(file) => {
                            info!(
                                %attempt,
                                has_mime_type = file.mime_type().is_some(),
                                "soil report selected"
                            );
                            model.session.set_file(file);
                            model.clear_error_if(|e| e.kind == ErrorKind::FileAcquisition);
                            caps.render.render();
                        }
                        PickOutcome::Cancelled => {
                            debug!(%attempt, "file pick cancelled");
                        }
                        PickOutcome::Failed(e) => {
                            warn!(%attempt, error = %e, "file pick failed");
                            model.set_error(AppError::from(e));
                            caps.render.render();
                        }
                    }
                }

                Event::FileRemoved => {
                    model.session.remove_file();
                    caps.render.render();
                }

                Event::OpenFileRequested => match model.session.selected_file() {
                    Some(file) => {
                        let target = OpenTarget::Document {
                            uri: file.uri().to_string(),
                            mime_type: file.mime_type().map(str::to_string),
                        };
                        Self::open(target, model, caps);
                    }
                    None => {
                        model.set_error(AppError::new(
                            ErrorKind::FileOpenUnavailable,
                            NO_FILE_NOTICE,
                        ));
                        caps.render.render();
                    }
                },

                Event::CropSelected { value } => match value.parse::<CropType>() {
                    Ok(crop) => {
                        model.session.select_crop(crop);
                        caps.render.render();
                    }
                    Err(e) => {
                        let error = AppError::from(e);
                        warn!(code = error.code(), %error, "rejected crop selection");
                    }
                },

                Event::LocationRequested => {
                    Self::start_location_attempt(model, caps);
                    caps.render.render();
                }

                Event::LocationPermissionChecked { attempt, result } => {
                    if !model.location_attempts.is_current(attempt) {
                        debug!(%attempt, "discarding superseded permission check");
                        return;
                    }

                    match *result {
                        Ok(output) => match output.permission_status() {
                            Some(status) if status.is_granted() => {
                                Self::request_position(attempt, model, caps);
                            }
                            Some(status) if status.can_request() => {
                                debug!(%attempt, ?status, "requesting location permission");
                                Self::request_permission(attempt, caps);
                            }
                            Some(status) => {
                                debug!(%attempt, ?status, "location permission unavailable");
                                let outcome = LocationState::Denied {
                                    needs_settings: status.should_show_settings_prompt(),
                                };
                                Self::settle_location(model, caps, attempt, outcome);
                            }
                            None => Self::settle_location(
                                model,
                                caps,
                                attempt,
                                LocationState::Failed(UNEXPECTED_GEOLOCATION_OUTPUT.into()),
                            ),
                        },
                        Err(e) if e.is_permission_error() => {
                            let outcome = LocationState::Denied {
                                needs_settings: false,
                            };
                            Self::settle_location(model, caps, attempt, outcome);
                        }
                        Err(e) => Self::settle_location(
                            model,
                            caps,
                            attempt,
                            LocationState::Failed(e.to_string()),
                        ),
                    }
                }

                Event::LocationPermissionRequested { attempt, result } => {
                    if !model.location_attempts.is_current(attempt) {
                        debug!(%attempt, "discarding superseded permission request");
                        return;
                    }

                    let outcome = match *result {
                        Ok(output) => match output.permission_status() {
                            Some(status) if status.is_granted() => {
                                Self::request_position(attempt, model, caps);
                                return;
                            }
                            Some(status) => LocationState::Denied {
                                needs_settings: status.should_show_settings_prompt(),
                            },
                            None => LocationState::Failed(UNEXPECTED_GEOLOCATION_OUTPUT.into()),
                        },
                        Err(e) if e.is_permission_error() => LocationState::Denied {
                            needs_settings: false,
                        },
                        Err(e) => LocationState::Failed(e.to_string()),
                    };
                    Self::settle_location(model, caps, attempt, outcome);
                }

                Event::PositionReceived { attempt, result } => {
                    let outcome = Self::position_outcome(*result);
                    Self::settle_location(model, caps, attempt, outcome);
                }

                Event::OpenMapRequested => {
                    let Some(coordinates) = model.session.location().coordinates() else {
                        model.set_error(AppError::new(
                            ErrorKind::MapUnavailable,
                            "Location is not available yet",
                        ));
                        caps.render.render();
                        return;
                    };

                    match map_link(&model.config.map_base_url, coordinates) {
                        Ok(url) => Self::open(OpenTarget::Url { url: url.into() }, model, caps),
                        Err(e) => {
                            model.set_error(
                                AppError::new(ErrorKind::MapUnavailable, "Could not build a map link")
                                    .with_internal(e.to_string()),
                            );
                            caps.render.render();
                        }
                    }
                }

                Event::OpenCompleted {
                    attempt,
                    kind,
                    result,
                } => {
                    if !model.open_attempts.finish(attempt) {
                        debug!(%attempt, ?kind, "discarding superseded open result");
                        return;
                    }

                    if let Err(e) = *result {
                        warn!(%attempt, ?kind, error = %e, "open failed");
                        let error = match kind {
                            OpenKind::Document => AppError::new(
                                ErrorKind::FileOpenUnavailable,
                                "Could not open the soil report",
                            ),
                            OpenKind::Map => {
                                AppError::new(ErrorKind::MapUnavailable, "Could not open the map")
                            }
                        };
                        model.set_error(error.with_internal(e.to_string()));
                        caps.render.render();
                    } else {
                        debug!(%attempt, ?kind, "opened");
                    }
                }

                Event::ReviewShown => {
                    model.session.show_review();
                    caps.render.render();
                }

                Event::ReviewHidden => {
                    model.session.hide_review();
                    caps.render.render();
                }

                Event::ResetRequested => {
                    model.reset_inputs();
                    info!("intake inputs reset");
                    caps.render.render();
                }

                Event::NoticeDismissed => {
                    model.clear_error();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            view::build(model)
        }
    }
}
