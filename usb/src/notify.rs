use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::size_of;

use anyhow::*;
use core::result::Result::Ok;
use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use windows::core::{w, Error as WinError, PCWSTR};
use windows::Win32::Devices::Usb::GUID_DEVINTERFACE_USB_DEVICE;
use windows::Win32::Foundation::{HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, RegisterClassW,
    RegisterDeviceNotificationW, TranslateMessage, UnregisterDeviceNotification,
    DBT_DEVICEARRIVAL, DBT_DEVICEREMOVECOMPLETE, DBT_DEVTYP_DEVICEINTERFACE,
    DEVICE_NOTIFY_WINDOW_HANDLE, DEV_BROADCAST_DEVICEINTERFACE_W, DEV_BROADCAST_HDR, HDEVNOTIFY,
    HWND_MESSAGE, MSG, WINDOW_EX_STYLE, WINDOW_STYLE, WM_DEVICECHANGE, WNDCLASSW,
};

use devwatch_core::{Broadcast, Notification};

type Handler = Box<dyn FnMut(Notification)>;

thread_local! {
    // The window procedure runs on the thread that created the window,
    // so one handler per thread is enough.
    static HANDLER: RefCell<Option<Handler>> = RefCell::new(None);
}

/// Message-only window subscribed to USB device interface broadcasts.
///
/// Notifications are delivered to the handler from inside the message loop
/// of the creating thread, either [DeviceNotifier::run] or the embedding
/// application's own loop.
pub struct DeviceNotifier {
    hwnd: HWND,
    notify: HDEVNOTIFY,
}

impl DeviceNotifier {
    pub fn new<F: FnMut(Notification) + 'static>(handler: F) -> Result<Self> {
        if HANDLER.with(|h| h.borrow().is_some()) {
            bail!("A device notifier is already active on this thread");
        }

        // SAFETY: C API calls
        let hinstance: HINSTANCE = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .context("Failed to get module handle")?
            .into();
        register_class(hinstance)?;

        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                class_name(),
                w!("DevNotifWnd"),
                WINDOW_STYLE::default(),
                0, 0, 0, 0,
                HWND_MESSAGE,
                None,
                hinstance,
                None,
            )
        }.context("Could not create message window")?;

        let notify = match register_notification(hwnd) {
            Ok(n) => n,
            Err(e) => {
                // SAFETY: hwnd was created above and is not used after this
                let _ = unsafe { DestroyWindow(hwnd) };
                return Err(e);
            }
        };

        HANDLER.with(|h| *h.borrow_mut() = Some(Box::new(handler)));
        debug!("Device notifier window {:?} registered", hwnd);

        Ok(Self { hwnd, notify })
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Pumps messages on the current thread until `WM_QUIT`.
    pub fn run(&self) -> Result<()> {
        let mut msg = MSG::default();
        loop {
            // SAFETY: C API calls with a valid MSG
            let rc = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
            match rc.0 {
                -1 => return Err(WinError::from_win32()).context("Message loop failed"),
                0 => break,
                _ => unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
        debug!("Message loop finished");
        Ok(())
    }
}

impl Drop for DeviceNotifier {
    fn drop(&mut self) {
        // SAFETY: both handles are owned by self
        unsafe {
            if let Err(e) = UnregisterDeviceNotification(self.notify) {
                warn!("Failed to unregister device notification: {e}");
            }
            if let Err(e) = DestroyWindow(self.hwnd) {
                warn!("Failed to destroy notifier window: {e}");
            }
        }
        HANDLER.with(|h| drop(h.borrow_mut().take()));
    }
}

fn class_name() -> PCWSTR {
    w!("DevWatchNotifyWnd")
}

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    static CLASS: OnceCell<u16> = OnceCell::new();

    CLASS.get_or_try_init(|| {
        let wnd_class = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinstance,
            lpszClassName: class_name(),
            ..Default::default()
        };
        // SAFETY: C API call with a fully initialized WNDCLASSW
        match unsafe { RegisterClassW(&wnd_class) } {
            0 => Err(WinError::from_win32()).context("Failed to register window class"),
            atom => Ok(atom),
        }
    })?;
    Ok(())
}

fn register_notification(hwnd: HWND) -> Result<HDEVNOTIFY> {
    let filter = DEV_BROADCAST_DEVICEINTERFACE_W {
        dbcc_size: size_of::<DEV_BROADCAST_DEVICEINTERFACE_W>() as u32,
        dbcc_devicetype: DBT_DEVTYP_DEVICEINTERFACE.0,
        dbcc_classguid: GUID_DEVINTERFACE_USB_DEVICE,
        ..Default::default()
    };

    // SAFETY: filter outlives the call
    unsafe {
        RegisterDeviceNotificationW(
            HANDLE(hwnd.0),
            &filter as *const DEV_BROADCAST_DEVICEINTERFACE_W as *const c_void,
            DEVICE_NOTIFY_WINDOW_HANDLE,
        )
    }.context("Could not register for device notifications")
}

/// Decodes the parameters of a `WM_DEVICECHANGE` message.
///
/// # Safety
///
/// For arrival and removal codes `lparam` must be null or point to a valid
/// `DEV_BROADCAST_HDR` as delivered with the message.
pub unsafe fn decode_device_change(wparam: WPARAM, lparam: LPARAM) -> Notification {
    let code = wparam.0 as u32;
    match code {
        DBT_DEVICEARRIVAL => Notification::Arrival(read_broadcast(lparam)),
        DBT_DEVICEREMOVECOMPLETE => Notification::RemoveComplete(read_broadcast(lparam)),
        _ => Notification::Other(code),
    }
}

unsafe fn read_broadcast(lparam: LPARAM) -> Broadcast {
    let hdr = lparam.0 as *const DEV_BROADCAST_HDR;
    if hdr.is_null() {
        return Broadcast::Other(0);
    }
    let devtype = (*hdr).dbch_devicetype;
    if devtype != DBT_DEVTYP_DEVICEINTERFACE {
        return Broadcast::Other(devtype.0);
    }

    // dbcc_name is a nul-terminated string running to the end of the
    // structure; dbch_size bounds it
    let iface = hdr as *const DEV_BROADCAST_DEVICEINTERFACE_W;
    let name = std::ptr::addr_of!((*iface).dbcc_name) as *const u16;
    let offset = name as usize - hdr as usize;
    let max = ((*hdr).dbch_size as usize).saturating_sub(offset) / size_of::<u16>();
    let chars = std::slice::from_raw_parts(name, max);
    let len = chars.iter().position(|&c| c == 0).unwrap_or(max);

    Broadcast::DeviceInterface { path: String::from_utf16_lossy(&chars[..len]) }
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg != WM_DEVICECHANGE {
        // SAFETY: C API call
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let r = std::panic::catch_unwind(|| {
        // SAFETY: parameters come straight from WM_DEVICECHANGE
        let notification = unsafe { decode_device_change(wparam, lparam) };
        HANDLER.with(|h| match h.try_borrow_mut() {
            Ok(mut h) => {
                if let Some(handler) = h.as_mut() {
                    handler(notification);
                }
            }
            Err(_) => error!("Dropping re-entrant device notification {:?}", notification),
        });
    });
    if let Err(e) = r {
        eprintln!("device notification handler panic: {e:?}");
        std::process::abort();
    }
    LRESULT(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::{addr_of_mut, copy_nonoverlapping};

    fn interface_broadcast(path: &str) -> Vec<u64> {
        let name: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();
        let header = size_of::<DEV_BROADCAST_DEVICEINTERFACE_W>();
        let bytes = header + name.len() * size_of::<u16>();
        let mut buf = vec![0u64; bytes / size_of::<u64>() + 1];

        let iface = buf.as_mut_ptr() as *mut DEV_BROADCAST_DEVICEINTERFACE_W;
        unsafe {
            let dst = addr_of_mut!((*iface).dbcc_name) as *mut u16;
            (*iface).dbcc_size = (dst as usize - iface as usize + name.len() * size_of::<u16>()) as u32;
            (*iface).dbcc_devicetype = DBT_DEVTYP_DEVICEINTERFACE.0;
            copy_nonoverlapping(name.as_ptr(), dst, name.len());
        }
        buf
    }

    #[test]
    fn decodes_interface_arrival() {
        let path = r"\\?\USB#VID_054C&PID_09CC#5&2ce1a6e4&0&1#{a5dcbf10-6530-11d2-901f-00c04fb951ed}";
        let buf = interface_broadcast(path);
        let n = unsafe {
            decode_device_change(WPARAM(DBT_DEVICEARRIVAL as usize), LPARAM(buf.as_ptr() as isize))
        };
        assert_eq!(n, Notification::Arrival(Broadcast::DeviceInterface { path: path.into() }));
    }

    #[test]
    fn decodes_other_device_type() {
        let mut hdr = DEV_BROADCAST_HDR {
            dbch_size: size_of::<DEV_BROADCAST_HDR>() as u32,
            ..Default::default()
        };
        hdr.dbch_devicetype.0 = 2;
        let n = unsafe {
            decode_device_change(
                WPARAM(DBT_DEVICEREMOVECOMPLETE as usize),
                LPARAM(&hdr as *const DEV_BROADCAST_HDR as isize),
            )
        };
        assert_eq!(n, Notification::RemoveComplete(Broadcast::Other(2)));
    }

    #[test]
    fn decodes_other_codes() {
        let n = unsafe { decode_device_change(WPARAM(0x0007), LPARAM(0)) };
        assert_eq!(n, Notification::Other(0x0007));
    }
}
