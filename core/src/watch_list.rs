use thiserror::Error;

use crate::model::DeviceIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("watch-list has {vendors} vendor ids but {products} product ids")]
    LengthMismatch { vendors: usize, products: usize },
}

/// Fixed set of devices to report on. Entries are matched as exact
/// vendor/product pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    entries: Vec<DeviceIdentity>,
}

impl WatchList {
    pub fn new(entries: Vec<DeviceIdentity>) -> Self {
        Self { entries }
    }

    /// Builds a watch-list from two positionally paired sequences:
    /// `vendors[i]` goes with `products[i]`.
    pub fn from_pairs(vendors: &[u16], products: &[u16]) -> Result<Self, ConfigurationError> {
        if vendors.len() != products.len() {
            return Err(ConfigurationError::LengthMismatch {
                vendors: vendors.len(),
                products: products.len(),
            });
        }

        let entries = vendors.iter().zip(products)
            .map(|(&vid, &pid)| DeviceIdentity::new(vid, pid))
            .collect();
        Ok(Self { entries })
    }

    pub fn is_watched(&self, identity: &DeviceIdentity) -> bool {
        self.entries.iter().any(|e| e == identity)
    }

    pub fn entries(&self) -> &[DeviceIdentity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<DeviceIdentity> for WatchList {
    fn from_iter<I: IntoIterator<Item = DeviceIdentity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
