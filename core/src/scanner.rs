use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info, trace, warn};

use crate::model::{DeviceEvent, DeviceIdentity};
use crate::sink::EventSink;
use crate::watch_list::WatchList;

/// Device class as reported by the platform. Only HID devices carry
/// vendor/product ids at this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    Hid { vid: u32, pid: u32 },
}

/// Platform access for enumerating attached input devices.
pub trait DeviceSource {
    type Handle: Copy + Debug;

    /// All currently attached devices. An empty list is not an error.
    fn list_devices(&self) -> Result<Vec<Self::Handle>>;
    fn device_name(&self, handle: Self::Handle) -> Result<String>;
    fn device_info(&self, handle: Self::Handle) -> Result<DeviceKind>;
}

/// One attached device, alive for a single iteration of the scan.
#[derive(Clone, Debug)]
pub struct RawDeviceRecord<H> {
    pub handle: H,
    pub name: String,
    pub kind: DeviceKind,
}

impl<H> RawDeviceRecord<H> {
    pub fn identity(&self) -> Option<DeviceIdentity> {
        match self.kind {
            DeviceKind::Hid { vid, pid } => {
                let vid = u16::try_from(vid).ok()?;
                let pid = u16::try_from(pid).ok()?;
                Some(DeviceIdentity::new(vid, pid))
            }
            DeviceKind::Mouse | DeviceKind::Keyboard => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub listed: usize,
    pub skipped: usize,
    pub detected: usize,
    pub aborted: bool,
}

/// Reports watched devices that are already attached when the process starts.
pub struct StartupScanner {
    watch_list: Arc<WatchList>,
}

impl StartupScanner {
    pub fn new(watch_list: Arc<WatchList>) -> Self {
        Self { watch_list }
    }

    pub fn scan<S: DeviceSource, E: EventSink>(&self, source: &S, sink: &mut E) -> ScanReport {
        let mut report = ScanReport::default();

        info!("Scanning attached devices...");
        let handles = match source.list_devices() {
            Ok(handles) => handles,
            Err(e) => {
                error!("Failed to list attached devices: {e:#}");
                report.aborted = true;
                return report;
            }
        };
        report.listed = handles.len();

        for handle in handles {
            let record = match Self::read_record(source, handle) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping device {handle:?}: {e:#}");
                    report.skipped += 1;
                    continue;
                }
            };
            trace!("Device {:?} {:?} {:?}", record.handle, record.name, record.kind);

            let Some(identity) = record.identity() else { continue };
            if self.watch_list.is_watched(&identity) {
                debug!("Watched device {} present at {:?}", identity, record.name);
                sink.dispatch(DeviceEvent::Detected(identity));
                report.detected += 1;
            }
        }

        info!("Scanning attached devices finished: {}/{} detected, {} skipped",
            report.detected, report.listed, report.skipped);
        report
    }

    fn read_record<S: DeviceSource>(source: &S, handle: S::Handle) -> Result<RawDeviceRecord<S::Handle>> {
        let name = source.device_name(handle)?;
        let kind = source.device_info(handle)?;
        Ok(RawDeviceRecord { handle, name, kind })
    }
}
