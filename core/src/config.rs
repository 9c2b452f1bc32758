use crate::watch_list::{ConfigurationError, WatchList};

// Positionally paired: VENDOR_IDS[i] goes with PRODUCT_IDS[i].
//  0, 1 - DualShock 4 controller (two hardware revisions)
//  2    - Cronus Zen
pub const VENDOR_IDS: &[u16] = &[0x054c, 0x054c, 0x2008];
pub const PRODUCT_IDS: &[u16] = &[0x054c, 0x09cc, 0x0010];

pub fn default_watch_list() -> Result<WatchList, ConfigurationError> {
    WatchList::from_pairs(VENDOR_IDS, PRODUCT_IDS)
}
