// Device interface paths look like:
//   \\?\USB#VID_054C&PID_09CC#5&2ce1a6e4&0&1#{a5dcbf10-6530-11d2-901f-00c04fb951ed}

use crate::model::DeviceIdentity;

pub const VID_MARKER: &str = "VID_";
pub const PID_MARKER: &str = "PID_";

const ID_DIGITS: usize = 4;

/// Reads the 4 hex digits following the first `marker` in `source`.
///
/// Returns `None` if the marker is missing, if fewer than 4 characters
/// follow it, or if any of them is not a hex digit.
pub fn extract_id(source: &str, marker: &str) -> Option<u16> {
    let start = source.find(marker)? + marker.len();
    let digits = source.get(start..start + ID_DIGITS)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Vendor and product id embedded in a device path, if both are present.
pub fn identity_from_path(path: &str) -> Option<DeviceIdentity> {
    let pid = extract_id(path, PID_MARKER)?;
    let vid = extract_id(path, VID_MARKER)?;
    Some(DeviceIdentity::new(vid, pid))
}
