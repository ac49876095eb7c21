use crate::windy_error::MyResult;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Window state that receives the messages of the windows it is bound to.
///
/// The window keeps a raw pointer to the value passed to
/// [`create_window`](super::create_window::create_window), so the value must
/// outlive the window. Handlers take `&self`; use cells for mutable state.
pub trait WindowClass {
    /// The name of the window class.
    const ID: PCWSTR;

    /// Returns true when the message was handled.
    fn handle(&self, message: u32, wparam: WPARAM, lparam: LPARAM) -> bool;
}

pub fn create_window_class_struct<W: WindowClass>(instance: HMODULE) -> MyResult<WNDCLASSEXW> {
    // WNDCLASSEXW - https://learn.microsoft.com/en-us/windows/win32/api/winuser/ns-winuser-wndclassexw
    let wc = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wndproc::<W>),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: W::ID,
        ..Default::default()
    };
    Ok(wc)
}

/// Panics must not unwind across the `extern "system"` boundary.
fn safe_handle<W: WindowClass>(window_data: &W, message: u32, wparam: WPARAM, lparam: LPARAM) -> bool {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        window_data.handle(message, wparam, lparam)
    }))
    .unwrap_or(false)
}

extern "system" fn wndproc<W: WindowClass>(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if message == WM_CREATE {
        unsafe {
            let create_struct: &CREATESTRUCTW = &*(lparam.0 as *const CREATESTRUCTW);
            SetWindowLongPtrW(window, GWLP_USERDATA, create_struct.lpCreateParams as _);
        }
        return LRESULT(0);
    }

    // Messages can arrive before WM_CREATE.
    let user_data = unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) };
    let handled = match std::ptr::NonNull::<W>::new(user_data as *mut W) {
        Some(window_data) => safe_handle(unsafe { window_data.as_ref() }, message, wparam, lparam),
        None => false,
    };

    if handled {
        LRESULT(0)
    } else {
        unsafe { DefWindowProcW(window, message, wparam, lparam) }
    }
}
