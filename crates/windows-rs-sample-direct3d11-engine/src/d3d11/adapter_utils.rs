use tracing::debug;
use tracing::info;
use windows::Win32::Graphics::Dxgi::*;

use crate::windy_error::MyResult;

/// First hardware adapter in enumeration order, skipping the software rasterizer.
///
/// `None` when the machine only has software adapters.
pub fn get_hardware_adapter(factory: &IDXGIFactory1) -> MyResult<Option<IDXGIAdapter1>> {
    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(a) => a,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(e.into()),
        };

        let desc = unsafe { adapter.GetDesc1()? };
        let adapter_name = String::from_utf16_lossy(&desc.Description);
        let adapter_name = adapter_name.trim_end_matches('\0');

        if (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE)
            != DXGI_ADAPTER_FLAG_NONE
        {
            debug!(index = i, adapter_name, "Skipping software adapter");
            continue;
        }

        info!(index = i, adapter_name, "Selected hardware adapter");
        return Ok(Some(adapter));
    }

    Ok(None)
}
