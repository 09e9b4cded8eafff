use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hands a document or link to the platform (`Linking.openURL`, an Android
/// `ACTION_VIEW` intent, `window.open`).
pub struct Opener<E> {
    context: CapabilityContext<OpenerOperation, E>,
}

impl<Ev> Capability<Ev> for Opener<Ev> {
    type Operation = OpenerOperation;
    type MappedSelf<MappedEv> = Opener<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Opener::new(self.context.map_event(f))
    }
}

impl<E> Opener<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<OpenerOperation, E>) -> Self {
        Self { context }
    }

    pub fn open<F>(&self, target: OpenTarget, callback: F)
    where
        F: FnOnce(OpenerResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(OpenerOperation::Open { target })
                .await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpenerOperation {
    Open { target: OpenTarget },
}

impl Operation for OpenerOperation {
    type Output = OpenerResult;
}

/// A picked document keeps its picker URI; the shell is responsible for
/// turning it into something the platform can open (content provider grant,
/// file URL, object URL).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpenTarget {
    Document {
        uri: String,
        mime_type: Option<String>,
    },
    Url {
        url: String,
    },
}

impl OpenTarget {
    pub fn is_document(&self) -> bool {
        matches!(self, OpenTarget::Document { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpenerOutput {
    Opened,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpenerError {
    #[error("no application can handle this target")]
    NoHandler,

    #[error("opening is not supported on this platform")]
    Unsupported,

    #[error("open failed: {message}")]
    Failed { message: String },
}

pub type OpenerResult = Result<OpenerOutput, OpenerError>;
