use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ParseError, ensure_supported};

/// Text IOS prints under the Root ID block when the local bridge is the root.
pub const ROOT_BRIDGE_MARKER: &str = "This bridge is the root";

const INTERFACE_TABLE_HEADER: &str = "Interface";

/// One row of the `show spanning-tree` interface table, as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpEntry {
    pub interface: String,
    pub role: String,
    pub status: String,
    pub cost: String,
    pub port_priority: String,
    pub port_id: String,
    pub port_type: String,
}

impl StpEntry {
    /// Parse a single interface table line.
    ///
    /// Expected example line:
    /// - `Gi0/0               Altn BLK 4         128.1    Shr`
    pub fn parse(line: &str) -> Result<Self, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [interface, role, status, cost, prio_nbr, rest @ ..] = tokens.as_slice() else {
            return Err(format!("not enough tokens in line: {line}"));
        };
        let (port_priority, port_id) = prio_nbr
            .split_once('.')
            .ok_or_else(|| format!("invalid Prio.Nbr '{prio_nbr}' in line '{line}'"))?;
        if cost.parse::<u32>().is_err() {
            return Err(format!("invalid cost '{cost}' in line '{line}'"));
        }
        Ok(StpEntry {
            interface: interface.to_string(),
            role: role.to_string(),
            status: status.to_string(),
            cost: cost.to_string(),
            port_priority: port_priority.to_string(),
            port_id: port_id.to_string(),
            port_type: rest.join(" "),
        })
    }
}

/// The first spanning tree instance of a `show spanning-tree` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpTable {
    pub vlan_id: Option<u16>,
    pub is_root: bool,
    pub entries: Vec<StpEntry>,
}

/// Parse `show spanning-tree`. Only the first instance is read; later VLAN blocks are ignored.
pub fn parse_stp(raw: &str, device_type: &str) -> Result<StpTable, ParseError> {
    ensure_supported(device_type)?;

    let mut table = StpTable::default();
    let mut seen_instance = false;
    let mut in_interface_table = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(vlan) = trimmed.strip_prefix("VLAN") {
            if seen_instance {
                break;
            }
            seen_instance = true;
            table.vlan_id = vlan.parse().ok();
            continue;
        }
        if trimmed.contains(ROOT_BRIDGE_MARKER) {
            table.is_root = true;
            continue;
        }
        if trimmed.starts_with(INTERFACE_TABLE_HEADER) && trimmed.contains("Role") {
            in_interface_table = true;
            continue;
        }
        if !in_interface_table || trimmed.is_empty() || trimmed.starts_with('-') {
            continue;
        }
        match StpEntry::parse(trimmed) {
            Ok(entry) => table.entries.push(entry),
            Err(e) => debug!("skipping spanning-tree line: {e}"),
        }
    }

    if !seen_instance && table.entries.is_empty() {
        return Err(ParseError::Malformed(
            "no spanning tree instance found".to_string(),
        ));
    }
    Ok(table)
}
