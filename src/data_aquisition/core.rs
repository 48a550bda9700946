use async_trait::async_trait;

use crate::{
    config::DeviceDescriptor,
    data_aquisition::ssh::SshError,
    network::device::{DeviceId, ProbeResult, ProbeStatus},
};

/// Raw text retrieved from one device, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct RawDeviceOutput {
    pub prompt: String,
    pub stp_output: String,
    pub cdp_output: String,
}

/// Turns one device descriptor into one probe result.
///
/// Implementations never fail: transport, authentication and parsing problems are captured
/// in `ProbeResult::status` so that every descriptor yields exactly one record.
#[async_trait]
pub trait DeviceProber: Send + Sync {
    async fn probe(&self, id: DeviceId, device: &DeviceDescriptor) -> ProbeResult;
}

impl From<&SshError> for ProbeStatus {
    fn from(e: &SshError) -> Self {
        match e {
            SshError::SshAuthError(_) => ProbeStatus::AuthFailure,
            SshError::Timeout(_) => ProbeStatus::Timeout,
            other => ProbeStatus::OtherFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_errors_classify() {
        assert_eq!(
            ProbeStatus::from(&SshError::SshAuthError("bad password".to_string())),
            ProbeStatus::AuthFailure
        );
        assert_eq!(
            ProbeStatus::from(&SshError::Timeout("no prompt".to_string())),
            ProbeStatus::Timeout
        );
        assert_eq!(
            ProbeStatus::from(&SshError::TcpError("connection refused".to_string())),
            ProbeStatus::OtherFailure("TCP error: connection refused".to_string())
        );
    }
}
