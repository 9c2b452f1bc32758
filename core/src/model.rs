use std::fmt;

/// USB vendor/product pair identifying a device model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vid: u16,
    pub pid: u16,
}

impl DeviceIdentity {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vid, self.pid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Detected(DeviceIdentity),
    Removed(DeviceIdentity),
}

impl DeviceEvent {
    pub fn identity(&self) -> DeviceIdentity {
        match self {
            DeviceEvent::Detected(id) => *id,
            DeviceEvent::Removed(id) => *id,
        }
    }
}
