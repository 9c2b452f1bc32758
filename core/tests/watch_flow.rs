use std::sync::Arc;

use anyhow::{bail, Result};
use devwatch_core::config::default_watch_list;
use devwatch_core::*;

#[derive(Default)]
struct Recorder {
    detected: Vec<DeviceIdentity>,
    removed: Vec<DeviceIdentity>,
}

impl EventSink for Recorder {
    fn on_detected(&mut self, identity: DeviceIdentity) {
        self.detected.push(identity);
    }

    fn on_removed(&mut self, identity: DeviceIdentity) {
        self.removed.push(identity);
    }
}

struct Attached(Vec<Option<DeviceKind>>);

impl DeviceSource for Attached {
    type Handle = usize;

    fn list_devices(&self) -> Result<Vec<usize>> {
        Ok((0..self.0.len()).collect())
    }

    fn device_name(&self, handle: usize) -> Result<String> {
        Ok(format!(r"\\?\HID#{handle:04}"))
    }

    fn device_info(&self, handle: usize) -> Result<DeviceKind> {
        match self.0[handle] {
            Some(kind) => Ok(kind),
            None => bail!("device {handle} went away"),
        }
    }
}

fn usb_path(vid: u16, pid: u16) -> String {
    format!(r"\\?\USB#VID_{vid:04X}&PID_{pid:04X}#7&1f2e3d4c&0&3#{{a5dcbf10-6530-11d2-901f-00c04fb951ed}}")
}

#[test]
fn startup_scan_then_hotplug() {
    let watch_list = Arc::new(default_watch_list().unwrap());
    let scanner = StartupScanner::new(watch_list.clone());
    let dispatcher = ChangeEventDispatcher::new(watch_list);
    let mut sink = Recorder::default();

    let attached = Attached(vec![
        Some(DeviceKind::Keyboard),
        Some(DeviceKind::Hid { vid: 0x054c, pid: 0x054c }),
        None,
        Some(DeviceKind::Hid { vid: 0x054c, pid: 0x0010 }),
    ]);
    let report = scanner.scan(&attached, &mut sink);
    assert_eq!(report, ScanReport { listed: 4, skipped: 1, detected: 1, aborted: false });
    assert_eq!(sink.detected, vec![DeviceIdentity::new(0x054c, 0x054c)]);

    let zen = usb_path(0x2008, 0x0010);
    dispatcher.handle(&Notification::Arrival(Broadcast::DeviceInterface { path: zen.clone() }), &mut sink);
    dispatcher.handle(&Notification::Other(0x0007), &mut sink);
    dispatcher.handle(&Notification::RemoveComplete(Broadcast::DeviceInterface { path: zen }), &mut sink);
    dispatcher.handle(&Notification::RemoveComplete(Broadcast::Other(2)), &mut sink);

    assert_eq!(sink.detected, vec![
        DeviceIdentity::new(0x054c, 0x054c),
        DeviceIdentity::new(0x2008, 0x0010),
    ]);
    assert_eq!(sink.removed, vec![DeviceIdentity::new(0x2008, 0x0010)]);
}

#[test]
fn mismatched_configuration_is_rejected_before_matching() {
    let err = WatchList::from_pairs(&[0x054c, 0x054c, 0x2008], &[0x054c, 0x09cc]).unwrap_err();
    assert!(matches!(err, ConfigurationError::LengthMismatch { vendors: 3, products: 2 }));
}
