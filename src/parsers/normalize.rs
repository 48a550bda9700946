//! Vendor text normalization.
//!
//! STP and CDP print the same port in different abbreviations (`Gi0/0` vs `Gig 0/0`) and CDP
//! reports neighbors by fully qualified name while the prompt carries only the hostname.
//! Everything is folded to one canonical form here so the builder can match by plain equality.

use tracing::debug;

use crate::{
    network::device::{CdpRow, StpRole, StpRow},
    parsers::{cdp::CdpEntry, stp::StpEntry},
};

/// Interface type prefixes, longest spelling first, with their canonical code.
const INTERFACE_PREFIXES: &[(&str, &str)] = &[
    ("tengigabitethernet", "Te"),
    ("gigabitethernet", "G"),
    ("fastethernet", "F"),
    ("port-channel", "Po"),
    ("ethernet", "E"),
    ("ten", "Te"),
    ("gig", "G"),
    ("fas", "F"),
    ("eth", "E"),
    ("te", "Te"),
    ("gi", "G"),
    ("fa", "F"),
    ("et", "E"),
    ("po", "Po"),
];

/// Canonical interface name: `<type code> <numbering>`, e.g. `G 0/0`.
/// Names with an unknown type prefix are returned trimmed and otherwise untouched.
pub fn canonical_interface(name: &str) -> String {
    let compact: String = name.split_whitespace().collect();
    let lower = compact.to_ascii_lowercase();
    for (prefix, code) in INTERFACE_PREFIXES {
        if let Some(numbering) = lower.strip_prefix(prefix) {
            if numbering.starts_with(|c: char| c.is_ascii_digit()) {
                return format!("{code} {numbering}");
            }
        }
    }
    name.trim().to_string()
}

/// Hostname part of a CDP device id (`SW4.lab.example.com` -> `SW4`).
pub fn canonical_hostname(device_id: &str) -> String {
    let trimmed = device_id.trim();
    trimmed.split('.').next().unwrap_or(trimmed).to_string()
}

/// Prompt identity: the prompt as printed, minus the privilege marker.
pub fn canonical_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();
    trimmed
        .strip_suffix('#')
        .or_else(|| trimmed.strip_suffix('>'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Convert parsed spanning-tree rows. Rows with a role outside Root/Desg/Altn/Back are dropped.
pub fn normalize_stp(entries: &[StpEntry]) -> Vec<StpRow> {
    entries
        .iter()
        .filter_map(|entry| {
            let Some(role) = StpRole::from_code(&entry.role) else {
                debug!(interface = %entry.interface, role = %entry.role, "ignoring port with unhandled role");
                return None;
            };
            Some(StpRow {
                interface: canonical_interface(&entry.interface),
                role,
                status: entry.status.trim().to_string(),
                cost: entry.cost.trim().parse().unwrap_or_default(),
            })
        })
        .collect()
}

pub fn normalize_cdp(entries: &[CdpEntry]) -> Vec<CdpRow> {
    entries
        .iter()
        .map(|entry| CdpRow {
            local_interface: canonical_interface(&entry.local_interface),
            neighbor_prompt: canonical_hostname(&entry.neighbor),
            neighbor_interface: canonical_interface(&entry.neighbor_interface),
        })
        .collect()
}
