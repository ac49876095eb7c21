use crate::win32::window_class::WindowClass;
use crate::win32::windy_window_class_id::ClassIdAtom;
use crate::windy_error::MyResult;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Creates an overlapped window of class `class`, bound to `window_data`.
///
/// `window_data` receives the window's messages and must outlive it.
pub fn create_window<W: WindowClass>(
    our_module: HMODULE,
    class: &ClassIdAtom,
    window_rect: RECT,
    title: &HSTRING,
    window_data: &W,
) -> MyResult<HWND> {
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class,
            title,
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            window_rect.right - window_rect.left,
            window_rect.bottom - window_rect.top,
            None, // no parent window
            None, // no menus
            Some(our_module.into()),
            Some(window_data as *const W as _),
        )
    }?;
    Ok(hwnd)
}
