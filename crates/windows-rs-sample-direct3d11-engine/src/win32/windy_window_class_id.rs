use windows::core::Param;
use windows::core::ParamValue;
use windows::core::PCWSTR;
use windows::Win32::UI::WindowsAndMessaging::RegisterClassExW;
use windows::Win32::UI::WindowsAndMessaging::WNDCLASSEXW;

use crate::windy_error::MyResult;

/// Equivalent to the MAKEINTATOM macro in C/C++.
///
/// The low-order word is the atom, the high-order word is zero.
///
/// https://learn.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-makeintatom
#[allow(non_snake_case)]
pub fn MAKEINTOATOM(atom: u16) -> PCWSTR {
    PCWSTR(atom as *const u16)
}

/// A registered window class, usable wherever a class name is expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassIdAtom(u16);

impl From<u16> for ClassIdAtom {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl Param<PCWSTR> for &ClassIdAtom {
    unsafe fn param(self) -> ParamValue<PCWSTR> {
        ParamValue::Owned(MAKEINTOATOM(self.0))
    }
}

pub fn register_window_class(class: &WNDCLASSEXW) -> MyResult<ClassIdAtom> {
    let atom = unsafe { RegisterClassExW(class) };
    if atom == 0 {
        return Err(windows::core::Error::from_win32().into());
    }
    Ok(ClassIdAtom(atom))
}
