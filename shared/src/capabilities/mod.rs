mod file_picker;
mod geolocation;
mod opener;

pub use self::file_picker::{
    normalize as normalize_pick, BrowserFile, DocumentPickConfig, FilePicker, FilePickerError,
    FilePickerOperation, FilePickerOutput, FilePickerResult, NativeDocument, PickOutcome,
    ANY_MIME_TYPE,
};
pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationOutput, GeolocationResult,
    PermissionStatus, Position, PositionOptions,
};
pub use self::opener::{
    OpenTarget, Opener, OpenerError, OpenerOperation, OpenerOutput, OpenerResult,
};

// Crux's built-in Render capability covers view updates as-is.
pub use crux_core::render::{Render, RenderOperation};

use crate::event::Event;

/// Shell-facing side effects. Each field type becomes one `Effect` variant
/// (`Effect::Render`, `Effect::FilePicker`, `Effect::Geolocation`,
/// `Effect::Opener`).
#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub file_picker: FilePicker<Event>,
    pub geolocation: Geolocation<Event>,
    pub opener: Opener<Event>,
}
