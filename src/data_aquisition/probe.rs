use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    config::{CollectorConfig, DeviceDescriptor},
    data_aquisition::{
        core::{DeviceProber, RawDeviceOutput},
        ssh::{SshClient, SshError},
    },
    network::device::{DeviceId, ProbeResult, ProbeStatus},
    parsers::{
        ParseError,
        cdp::parse_cdp,
        normalize::{canonical_prompt, normalize_cdp, normalize_stp},
        stp::parse_stp,
    },
};

/// Probes Cisco switches over an interactive SSH session.
pub struct SshProber {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshProber {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            command_timeout: config.command_timeout,
        }
    }

    async fn fetch_raw(&self, device: &DeviceDescriptor) -> Result<RawDeviceOutput, SshError> {
        let mut client = SshClient::new_with_password(
            device.username.clone(),
            device.host.clone(),
            device.password.clone(),
            device.port,
        )
        .with_timeouts(self.connect_timeout, self.command_timeout);
        client.connect().await?;

        let output = async {
            if let Some(secret) = &device.secret {
                client.enable(secret).await?;
            }
            let prompt = client.find_prompt().await?;
            let stp_output = client.execute_command(&device.spanning_tree_command).await?;
            let cdp_output = client.execute_command(&device.cdp_neighbors_command).await?;
            Ok::<_, SshError>(RawDeviceOutput {
                prompt,
                stp_output,
                cdp_output,
            })
        }
        .await;

        if let Err(e) = client.close().await {
            debug!(host = %device.host, "closing session: {e}");
        }
        output
    }
}

/// Parse and normalize raw output into a successful probe result.
pub fn build_probe_result(
    id: DeviceId,
    device: &DeviceDescriptor,
    raw: &RawDeviceOutput,
) -> Result<ProbeResult, ParseError> {
    let stp = parse_stp(&raw.stp_output, &device.device_type)?;
    let cdp = parse_cdp(&raw.cdp_output, &device.device_type)?;
    Ok(ProbeResult {
        id,
        device_type: device.device_type.clone(),
        host_address: device.host.clone(),
        prompt: canonical_prompt(&raw.prompt),
        status: ProbeStatus::Success,
        stp_rows: normalize_stp(&stp.entries),
        cdp_rows: normalize_cdp(&cdp),
        is_root: stp.is_root,
        level: None,
    })
}

#[async_trait]
impl DeviceProber for SshProber {
    async fn probe(&self, id: DeviceId, device: &DeviceDescriptor) -> ProbeResult {
        debug!(%id, host = %device.host, "probing");
        let raw = match self.fetch_raw(device).await {
            Ok(raw) => raw,
            Err(e) => {
                let status = ProbeStatus::from(&e);
                warn!(%id, host = %device.host, %status, "probe failed");
                return ProbeResult::failed(id, &device.host, &device.device_type, status);
            }
        };
        match build_probe_result(id, device, &raw) {
            Ok(result) => {
                info!(
                    %id,
                    host = %device.host,
                    prompt = %result.prompt,
                    stp_rows = result.stp_rows.len(),
                    cdp_rows = result.cdp_rows.len(),
                    "probe succeeded"
                );
                result
            }
            Err(e) => {
                warn!(%id, host = %device.host, "unusable device output: {e}");
                ProbeResult::failed(id, &device.host, &device.device_type, ProbeStatus::OtherFailure(e.to_string()))
            }
        }
    }
}
