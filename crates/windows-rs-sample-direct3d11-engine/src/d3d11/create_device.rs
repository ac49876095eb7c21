use tracing::info;
use tracing::warn;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct2D::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::DirectWrite::*;
use windows::Win32::Graphics::Dxgi::*;

use super::adapter_utils::get_hardware_adapter;
use super::DeviceOptions;
use crate::windy_error::MyResult;

/// Every feature level the sample can run on, best first.
const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 7] = [
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_10_1,
    D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_9_3,
    D3D_FEATURE_LEVEL_9_2,
    D3D_FEATURE_LEVEL_9_1,
];

pub struct CreatedDevice {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    pub info_queue: Option<IDXGIInfoQueue>,
}

/// Factories that do not depend on the Direct3D device and survive device loss.
pub fn create_device_independent_factories(
    options: &DeviceOptions,
) -> MyResult<(ID2D1Factory1, IDWriteFactory)> {
    let factory_options = D2D1_FACTORY_OPTIONS {
        debugLevel: match options.debug_layer {
            true => D2D1_DEBUG_LEVEL_INFORMATION,
            false => D2D1_DEBUG_LEVEL_NONE,
        },
    };
    let d2d_factory: ID2D1Factory1 = unsafe {
        D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, Some(&factory_options))?
    };
    let dwrite_factory: IDWriteFactory = unsafe { DWriteCreateFactory(DWRITE_FACTORY_TYPE_SHARED)? };
    Ok((d2d_factory, dwrite_factory))
}

/// Creates the Direct3D 11 device and immediate context.
///
/// Uses the first hardware adapter unless WARP was requested, and falls back
/// to WARP when no hardware device can be created.
pub fn create_device(options: &DeviceOptions) -> MyResult<CreatedDevice> {
    // Required for Direct2D interop.
    let mut creation_flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT;
    let mut info_queue: Option<IDXGIInfoQueue> = None;

    if options.debug_layer {
        if sdk_layers_available() {
            creation_flags |= D3D11_CREATE_DEVICE_DEBUG;
            info!("D3D11 Debug Layer Enabled");
            match unsafe { DXGIGetDebugInterface1::<IDXGIInfoQueue>(0) } {
                Ok(queue) => info_queue = Some(queue),
                Err(e) => warn!("Failed to get DXGI Info Queue: {e:?}"),
            }
        } else {
            warn!("Warning: D3D11 Debug Layer unavailable.");
        }
    }

    let created = if options.use_warp_device {
        info!("Using WARP adapter.");
        d3d11_create_device(None::<&IDXGIAdapter>, D3D_DRIVER_TYPE_WARP, creation_flags)?
    } else {
        let dxgi_factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1()? };
        let hardware = match get_hardware_adapter(&dxgi_factory)? {
            Some(adapter) => {
                d3d11_create_device(&adapter, D3D_DRIVER_TYPE_UNKNOWN, creation_flags)
            }
            None => Err(Error::new(DXGI_ERROR_NOT_FOUND, "No hardware adapter found.")),
        };
        match hardware {
            Ok(created) => created,
            Err(e) => {
                warn!("Hardware device creation failed, falling back to WARP: {e}");
                d3d11_create_device(None::<&IDXGIAdapter>, D3D_DRIVER_TYPE_WARP, creation_flags)?
            }
        }
    };

    let (device, context, feature_level) = created;
    info!(feature_level = feature_level.0, "Created Direct3D 11 device");
    Ok(CreatedDevice {
        device,
        context,
        info_queue,
    })
}

fn d3d11_create_device<P0: Param<IDXGIAdapter>>(
    adapter: P0,
    driver_type: D3D_DRIVER_TYPE,
    flags: D3D11_CREATE_DEVICE_FLAG,
) -> Result<(ID3D11Device, ID3D11DeviceContext, D3D_FEATURE_LEVEL)> {
    let mut device = None;
    let mut context = None;
    let mut feature_level = D3D_FEATURE_LEVEL::default();
    unsafe {
        D3D11CreateDevice(
            adapter,
            driver_type,
            HMODULE::default(),
            flags,
            Some(&FEATURE_LEVELS),
            D3D11_SDK_VERSION,
            Some(&mut device),
            Some(&mut feature_level),
            Some(&mut context),
        )?
    };
    match (device, context) {
        (Some(device), Some(context)) => Ok((device, context, feature_level)),
        _ => Err(Error::new(E_FAIL, "D3D11CreateDevice returned no device")),
    }
}

/// Whether the Direct3D SDK layers are installed, needed for the debug device.
fn sdk_layers_available() -> bool {
    unsafe {
        D3D11CreateDevice(
            None::<&IDXGIAdapter>,
            D3D_DRIVER_TYPE_NULL,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_DEBUG,
            None,
            D3D11_SDK_VERSION,
            None,
            None,
            None,
        )
    }
    .is_ok()
}
