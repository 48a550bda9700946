use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ParseError, ensure_supported};

/// One neighbor of the `show cdp neighbors` table, as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdpEntry {
    pub neighbor: String,
    pub local_interface: String,
    pub holdtime: String,
    pub capability: String,
    pub platform: String,
    pub neighbor_interface: String,
}

/// Column start offsets taken from the table header.
#[derive(Debug, Clone, Copy)]
struct Columns {
    local_interface: usize,
    holdtime: usize,
    capability: usize,
    platform: usize,
    port_id: usize,
}

impl Columns {
    fn from_header(line: &str) -> Option<Self> {
        if !line.starts_with("Device ID") {
            return None;
        }
        Some(Columns {
            local_interface: line.find("Local Intrfce")?,
            holdtime: line.find("Holdtme")?,
            capability: line.find("Capability")?,
            platform: line.find("Platform")?,
            port_id: line.find("Port ID")?,
        })
    }

    fn parse_row(&self, neighbor: &str, line: &str) -> Result<CdpEntry, String> {
        let local_interface = slice(line, self.local_interface, self.holdtime);
        let neighbor_interface = slice(line, self.port_id, line.len());
        if neighbor.is_empty() || local_interface.is_empty() || neighbor_interface.is_empty() {
            return Err(format!("incomplete neighbor row: {line}"));
        }
        Ok(CdpEntry {
            neighbor: neighbor.to_string(),
            local_interface,
            holdtime: slice(line, self.holdtime, self.capability),
            capability: slice(line, self.capability, self.platform),
            platform: slice(line, self.platform, self.port_id),
            neighbor_interface,
        })
    }
}

/// Trimmed `line[start..end]`, tolerant of short lines.
fn slice(line: &str, start: usize, end: usize) -> String {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim().to_string()
}

/// Parse `show cdp neighbors`.
///
/// Device IDs longer than the first column are printed on a line of their own, with the
/// remaining columns on the next line; both layouts are accepted.
pub fn parse_cdp(raw: &str, device_type: &str) -> Result<Vec<CdpEntry>, ParseError> {
    ensure_supported(device_type)?;

    let mut columns: Option<Columns> = None;
    let mut pending_neighbor: Option<String> = None;
    let mut entries = Vec::new();

    for line in raw.lines() {
        let line = line.trim_end();
        let Some(cols) = columns else {
            columns = Columns::from_header(line);
            continue;
        };
        if line.trim().is_empty() || line.starts_with("Total cdp entries") {
            pending_neighbor = None;
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or_default();
        if !indented && tokens.next().is_none() {
            // Long device id, columns follow on the next line.
            pending_neighbor = Some(first.to_string());
            continue;
        }

        let neighbor = if indented {
            pending_neighbor.take().unwrap_or_default()
        } else {
            pending_neighbor = None;
            first.to_string()
        };
        match cols.parse_row(&neighbor, line) {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!("skipping cdp line: {e}"),
        }
    }

    if columns.is_none() && !raw.trim().is_empty() {
        return Err(ParseError::Malformed(
            "cdp neighbor table header not found".to_string(),
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cdp_neighbors() {
        let input = include_str!("../../test_data/cdp_neighbors.txt");
        let entries = parse_cdp(input, "cisco_ios").unwrap();

        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].neighbor, "SW1.jeremysitlab.com");
        assert_eq!(entries[0].local_interface, "Gig 0/0");
        assert_eq!(entries[0].holdtime, "125");
        assert_eq!(entries[0].capability, "R S I");
        assert_eq!(entries[0].platform, "");
        assert_eq!(entries[0].neighbor_interface, "Gig 0/2");

        assert_eq!(entries[2].neighbor, "SW4");
        assert_eq!(entries[2].local_interface, "Gig 1/2");
        assert_eq!(entries[2].platform, "WS-C3560");
        assert_eq!(entries[2].neighbor_interface, "Gig 1/1");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_cdp("", "cisco_ios").unwrap().is_empty());
    }

    #[test]
    fn test_parse_cdp_disabled() {
        let err = parse_cdp("% CDP is not enabled", "cisco_ios").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}
