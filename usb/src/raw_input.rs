use std::ffi::c_void;
use std::mem::size_of;

use anyhow::*;
use core::result::Result::Ok;
use windows::core::Error as WinError;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::UI::Input::{
    GetRawInputDeviceInfoW, GetRawInputDeviceList, RAWINPUTDEVICELIST, RID_DEVICE_INFO,
    RIDI_DEVICEINFO, RIDI_DEVICENAME, RIM_TYPEHID, RIM_TYPEKEYBOARD, RIM_TYPEMOUSE,
};

use devwatch_core::{DeviceKind, DeviceSource};

const QUERY_FAILED: u32 = u32::MAX;

/// Attached input devices as seen by the raw input API.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawInput;

impl DeviceSource for RawInput {
    type Handle = HANDLE;

    fn list_devices(&self) -> Result<Vec<HANDLE>> {
        let entry_size = size_of::<RAWINPUTDEVICELIST>() as u32;

        let mut count = 0u32;
        // SAFETY: a null list only queries the device count
        let rc = unsafe { GetRawInputDeviceList(None, &mut count, entry_size) };
        if rc == QUERY_FAILED {
            return Err(WinError::from_win32()).context("Failed to count raw input devices");
        }
        if count == 0 {
            return Ok(vec![]);
        }

        let mut list = vec![RAWINPUTDEVICELIST::default(); count as usize];
        // SAFETY: list holds `count` entries
        let rc = unsafe { GetRawInputDeviceList(Some(list.as_mut_ptr()), &mut count, entry_size) };
        if rc == QUERY_FAILED {
            return Err(WinError::from_win32()).context("Failed to list raw input devices");
        }
        list.truncate(rc as usize);

        Ok(list.into_iter().map(|d| d.hDevice).collect())
    }

    fn device_name(&self, handle: HANDLE) -> Result<String> {
        let mut len = 0u32;
        // SAFETY: a null buffer only queries the name length, in characters
        let rc = unsafe { GetRawInputDeviceInfoW(handle, RIDI_DEVICENAME, None, &mut len) };
        if rc == QUERY_FAILED {
            return Err(WinError::from_win32()).context("Failed to query device name length");
        }

        let mut name = vec![0u16; len as usize + 1];
        // SAFETY: name holds at least `len` characters
        let rc = unsafe {
            GetRawInputDeviceInfoW(handle, RIDI_DEVICENAME, Some(name.as_mut_ptr() as *mut c_void), &mut len)
        };
        if rc == QUERY_FAILED {
            return Err(WinError::from_win32()).context("Failed to query device name");
        }

        let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        Ok(String::from_utf16_lossy(&name[..end]))
    }

    fn device_info(&self, handle: HANDLE) -> Result<DeviceKind> {
        let mut info = RID_DEVICE_INFO {
            cbSize: size_of::<RID_DEVICE_INFO>() as u32,
            ..Default::default()
        };
        let mut size = info.cbSize;
        // SAFETY: info is a properly sized RID_DEVICE_INFO
        let rc = unsafe {
            GetRawInputDeviceInfoW(handle, RIDI_DEVICEINFO, Some(&mut info as *mut _ as *mut c_void), &mut size)
        };
        if rc == QUERY_FAILED {
            return Err(WinError::from_win32()).context("Failed to query device info");
        }

        match info.dwType {
            RIM_TYPEMOUSE => Ok(DeviceKind::Mouse),
            RIM_TYPEKEYBOARD => Ok(DeviceKind::Keyboard),
            RIM_TYPEHID => {
                // SAFETY: dwType says the union holds the HID variant
                let hid = unsafe { info.Anonymous.hid };
                Ok(DeviceKind::Hid { vid: hid.dwVendorId, pid: hid.dwProductId })
            }
            other => bail!("Unknown raw input device type {}", other.0),
        }
    }
}
