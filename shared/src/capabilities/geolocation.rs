use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_POSITION_TIMEOUT_MS: u64 = 30_000;

pub struct Geolocation<E> {
    context: CapabilityContext<GeolocationOperation, E>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<E> Geolocation<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, E>) -> Self {
        Self { context }
    }

    /// Native only: reads the current foreground permission without prompting.
    pub fn check_permission<F>(&self, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        self.request(GeolocationOperation::CheckPermission, callback);
    }

    /// Native only: prompts for foreground location permission.
    pub fn request_permission<F>(&self, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        self.request(GeolocationOperation::RequestPermission, callback);
    }

    pub fn current_position<F>(&self, options: PositionOptions, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        self.request(
            GeolocationOperation::GetCurrentPosition { options },
            callback,
        );
    }

    fn request<F>(&self, operation: GeolocationOperation, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationOperation {
    CheckPermission,
    RequestPermission,
    GetCurrentPosition { options: PositionOptions },
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout_ms: u64,
    pub high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_POSITION_TIMEOUT_MS,
            high_accuracy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    DeniedPermanently,
    Restricted,
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }

    /// Whether prompting the user could still change the answer.
    pub fn can_request(&self) -> bool {
        matches!(self, PermissionStatus::NotDetermined | PermissionStatus::Denied)
    }

    pub fn should_show_settings_prompt(&self) -> bool {
        matches!(
            self,
            PermissionStatus::DeniedPermanently | PermissionStatus::Restricted
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeolocationOutput {
    PermissionStatus(PermissionStatus),
    Position(Position),
}

impl GeolocationOutput {
    pub fn permission_status(&self) -> Option<PermissionStatus> {
        match self {
            GeolocationOutput::PermissionStatus(status) => Some(*status),
            GeolocationOutput::Position(_) => None,
        }
    }

    pub fn into_position(self) -> Option<Position> {
        match self {
            GeolocationOutput::Position(position) => Some(position),
            GeolocationOutput::PermissionStatus(_) => None,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location services unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("location request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("position unavailable: {message}")]
    PositionFailed { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GeolocationError {
    pub fn is_permission_error(&self) -> bool {
        matches!(self, GeolocationError::PermissionDenied)
    }
}

pub type GeolocationResult = Result<GeolocationOutput, GeolocationError>;
