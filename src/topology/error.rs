use thiserror::Error;

/// Conditions that stop graph construction. Per-device probe failures are not errors here;
/// they live in `ProbeStatus` and only become fatal when nothing succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no devices to probe")]
    EmptyDeviceSet,
    #[error("no successful connections were made")]
    NoSuccessfulProbes,
    #[error("prompt {prompt:?} is shared by {count} devices; neighbor names cannot be resolved")]
    DuplicatePrompt { prompt: String, count: usize },
    #[error("no root bridge found")]
    NoRootBridgeFound,
}
