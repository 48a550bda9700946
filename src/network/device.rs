use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifier of a probed device. Assigned from the device's position in the inventory
/// before any probe is dispatched, so it is dense (0..N-1) and never shared between workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub usize);

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of probing a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeStatus {
    Success,
    AuthFailure,
    Timeout,
    OtherFailure(String),
}

impl ProbeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeStatus::Success)
    }

    /// Short name used as a summary bucket. The failure detail is not part of it.
    pub fn bucket(&self) -> &'static str {
        match self {
            ProbeStatus::Success => "success",
            ProbeStatus::AuthFailure => "authentication_failure",
            ProbeStatus::Timeout => "timeout",
            ProbeStatus::OtherFailure(_) => "other_failure",
        }
    }
}

impl Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::OtherFailure(detail) => write!(f, "other_failure: {detail}"),
            other => write!(f, "{}", other.bucket()),
        }
    }
}

/// Spanning tree port role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StpRole {
    Root,
    Designated,
    Alternate,
    Backup,
}

impl StpRole {
    /// Maps the role column of `show spanning-tree` (`Root`, `Desg`, `Altn`, `Back`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "Root" => Some(StpRole::Root),
            "Desg" | "Designated" => Some(StpRole::Designated),
            "Altn" | "Alternate" => Some(StpRole::Alternate),
            "Back" | "Backup" => Some(StpRole::Backup),
            _ => None,
        }
    }

    /// A port in this role does not forward; the link behind it is a blocked link.
    pub fn is_blocking(&self) -> bool {
        matches!(self, StpRole::Alternate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpRow {
    pub interface: String,
    pub role: StpRole,
    pub status: String,
    pub cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdpRow {
    pub local_interface: String,
    pub neighbor_prompt: String,
    pub neighbor_interface: String,
}

/// Everything the topology builder knows about one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: DeviceId,
    pub device_type: String,
    pub host_address: String,
    /// CLI prompt without the privilege marker; the join key for CDP neighbor names.
    pub prompt: String,
    pub status: ProbeStatus,
    #[serde(default)]
    pub stp_rows: Vec<StpRow>,
    #[serde(default)]
    pub cdp_rows: Vec<CdpRow>,
    #[serde(default)]
    pub is_root: bool,
    /// `None` until the builder resolves it.
    #[serde(default)]
    pub level: Option<u32>,
}

impl ProbeResult {
    /// Record for a device whose probe did not complete.
    pub fn failed(id: DeviceId, host_address: &str, device_type: &str, status: ProbeStatus) -> Self {
        Self {
            id,
            device_type: device_type.to_string(),
            host_address: host_address.to_string(),
            prompt: String::new(),
            status,
            stp_rows: Vec::new(),
            cdp_rows: Vec::new(),
            is_root: false,
            level: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn title(&self) -> String {
        format!("SVI: {} - Platform: {}", self.host_address, self.device_type)
    }

    /// CDP row whose local port is `interface`, if any.
    pub fn cdp_row_on(&self, interface: &str) -> Option<&CdpRow> {
        self.cdp_rows.iter().find(|row| row.local_interface == interface)
    }

    pub fn blocking_ports(&self) -> impl Iterator<Item = &StpRow> {
        self.stp_rows.iter().filter(|row| row.role.is_blocking())
    }
}
