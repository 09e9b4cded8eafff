use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::FileDescriptor;

pub const ANY_MIME_TYPE: &str = "*/*";
pub const MAX_ACCEPTED_TYPES: usize = 32;

pub struct FilePicker<E> {
    context: CapabilityContext<FilePickerOperation, E>,
}

impl<Ev> Capability<Ev> for FilePicker<Ev> {
    type Operation = FilePickerOperation;
    type MappedSelf<MappedEv> = FilePicker<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        FilePicker::new(self.context.map_event(f))
    }
}

impl<E> FilePicker<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<FilePickerOperation, E>) -> Self {
        Self { context }
    }

    /// Opens the platform document chooser. The callback receives the raw
    /// shell result; use [`normalize`] to fold it into a [`PickOutcome`].
    pub fn pick_document<F>(&self, config: DocumentPickConfig, callback: F)
    where
        F: FnOnce(FilePickerResult) -> E + Send + 'static,
    {
        let config = config.validated();
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(FilePickerOperation::PickDocument { config })
                .await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilePickerOperation {
    PickDocument { config: DocumentPickConfig },
}

impl Operation for FilePickerOperation {
    type Output = FilePickerResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentPickConfig {
    pub mime_types: Vec<String>,
    pub copy_to_cache: bool,
    pub allow_multiple: bool,
}

impl Default for DocumentPickConfig {
    fn default() -> Self {
        Self {
            mime_types: vec![ANY_MIME_TYPE.to_string()],
            copy_to_cache: true,
            allow_multiple: false,
        }
    }
}

impl DocumentPickConfig {
    #[must_use]
    pub fn with_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_copy_to_cache(mut self, copy: bool) -> Self {
        self.copy_to_cache = copy;
        self
    }

    /// Drops blank entries, caps the list and falls back to `*/*` when
    /// nothing usable is left. A session holds a single report, so
    /// multi-select is always off.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.mime_types = self
            .mime_types
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_ACCEPTED_TYPES)
            .collect();
        if self.mime_types.is_empty() {
            self.mime_types.push(ANY_MIME_TYPE.to_string());
        }
        self.allow_multiple = false;
        self
    }
}

/// Shape reported by the iOS/Android document pickers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeDocument {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Shape reported by a browser `<input type="file">`: an object URL plus
/// the `File` metadata, where `content_type` is empty for unknown types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowserFile {
    pub object_url: String,
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilePickerOutput {
    Native(NativeDocument),
    Browser(BrowserFile),
    Cancelled,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilePickerError {
    #[error("document selection cancelled by user")]
    Cancelled,

    #[error("storage permission denied")]
    PermissionDenied,

    #[error("document picker unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("picker already open")]
    Busy,

    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl FilePickerError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FilePickerError::Busy | FilePickerError::Unavailable { .. }
        )
    }
}

pub type FilePickerResult = Result<FilePickerOutput, FilePickerError>;

/// The single outcome contract the coordinator works with, whatever shape
/// the shell answered in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(FileDescriptor),
    Cancelled,
    Failed(FilePickerError),
}

pub fn normalize(result: FilePickerResult) -> PickOutcome {
    let descriptor = match result {
        Ok(FilePickerOutput::Cancelled) | Err(FilePickerError::Cancelled) => {
            return PickOutcome::Cancelled;
        }
        Err(e) => return PickOutcome::Failed(e),
        Ok(FilePickerOutput::Native(doc)) => {
            FileDescriptor::new(doc.uri, doc.name.unwrap_or_default(), doc.mime_type)
        }
        Ok(FilePickerOutput::Browser(file)) => {
            FileDescriptor::new(file.object_url, file.file_name, Some(file.content_type))
        }
    };

    match descriptor {
        Ok(descriptor) => PickOutcome::Picked(descriptor),
        Err(e) => PickOutcome::Failed(e),
    }
}
