/*
This module turns raw CLI output into structured rows, and rows into the vendor-agnostic
records the topology builder consumes.

--- data_aquisition module ---
SSH CLI session
|
| Raw command output, data_aquisition doesn't care what the text means
v
--- parsers module ---
Vendor rows (stp, cdp) -> normalized records (normalize)
|
v
--- topology module ---
Leveled graph
*/

use thiserror::Error;

pub mod cdp;
pub mod normalize;
pub mod stp;

pub const CISCO_IOS: &str = "cisco_ios";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed output: {0}")]
    Malformed(String),
    #[error("unsupported device type: {0}")]
    Unsupported(String),
}

fn ensure_supported(device_type: &str) -> Result<(), ParseError> {
    if device_type == CISCO_IOS {
        Ok(())
    } else {
        Err(ParseError::Unsupported(device_type.to_string()))
    }
}
