//! Direct3D 11 + Direct2D implementation of [`DeviceResources`].

pub mod adapter_utils;
pub mod compile_shader;
pub mod create_device;
pub mod debug_messages;
pub mod direct2d;
pub mod graphics;

use bevy_math::Affine2;
use bevy_math::Mat4;
use std::cell::Cell;
use std::cell::RefCell;
use tracing::info;
use tracing::warn;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct2D::Common::*;
use windows::Win32::Graphics::Direct2D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::DirectWrite::IDWriteFactory;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::UI::WindowsAndMessaging::GetClientRect;

use crate::config::EngineConfig;
use crate::device_resources::ColorF;
use crate::device_resources::DeviceNotify;
use crate::device_resources::DeviceResources;
use crate::device_resources::Present;
use crate::device_resources::Size;
use crate::orientation::DisplayOrientation;
use crate::windy_error::MyResult;
use create_device::create_device;
use create_device::create_device_independent_factories;
use debug_messages::print_dxgi_debug_messages;
use direct2d::D3D11Drawing2D;
use graphics::D3D11Context;
use graphics::D3D11Device;

const BACK_BUFFER_COUNT: u32 = 2;
const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_B8G8R8A8_UNORM;
const DEPTH_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D24_UNORM_S8_UINT;

#[derive(Clone, Copy, Debug)]
pub struct DeviceOptions {
    pub use_warp_device: bool,
    pub debug_layer: bool,
    pub vsync: bool,
}

impl From<&EngineConfig> for DeviceOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            use_warp_device: config.use_warp_device,
            debug_layer: config.debug_layer,
            vsync: config.vsync,
        }
    }
}

/// Outcome of a logical size change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resize {
    Unchanged,
    Resized,
    /// Resizing the swap chain found the device removed.
    DeviceLost,
}

struct DeviceDependent {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    d2d_context: ID2D1DeviceContext,
    info_queue: Option<IDXGIInfoQueue>,
}

struct SizeDependent {
    swap_chain: IDXGISwapChain1,
    render_target_view: ID3D11RenderTargetView,
    depth_stencil_view: ID3D11DepthStencilView,
    viewport: D3D11_VIEWPORT,
}

/// Owns the device, swap chain and factories for one window.
pub struct D3D11DeviceResources {
    hwnd: HWND,
    options: DeviceOptions,

    d2d_factory: ID2D1Factory1,
    dwrite_factory: IDWriteFactory,

    device_dependent: RefCell<DeviceDependent>,
    size_dependent: RefCell<Option<SizeDependent>>,

    logical_size: Cell<Size>,
    output_size: Cell<Size>,
    orientation: Cell<DisplayOrientation>,
}

impl D3D11DeviceResources {
    pub fn new(hwnd: HWND, options: DeviceOptions) -> MyResult<Self> {
        let (d2d_factory, dwrite_factory) = create_device_independent_factories(&options)?;
        let device_dependent = create_device_dependent(&options, &d2d_factory)?;

        let resources = Self {
            hwnd,
            options,
            d2d_factory,
            dwrite_factory,
            device_dependent: RefCell::new(device_dependent),
            size_dependent: RefCell::new(None),
            logical_size: Cell::new(client_size(hwnd)?),
            output_size: Cell::new(Size::default()),
            // Desktop windows never rotate.
            orientation: Cell::new(DisplayOrientation::Identity),
        };
        if resources.create_window_size_dependent_resources()? == Resize::DeviceLost {
            return Err(eyre::eyre!("Graphics device removed while creating the swap chain").into());
        }
        Ok(resources)
    }

    /// Call when the window's client area changed size.
    pub fn set_logical_size(&self, logical_size: Size) -> MyResult<Resize> {
        if self.logical_size.get() == logical_size {
            return Ok(Resize::Unchanged);
        }
        self.logical_size.set(logical_size);
        self.create_window_size_dependent_resources()
    }

    /// Size of the window's client area, for resize handling.
    pub fn client_size(&self) -> MyResult<Size> {
        client_size(self.hwnd)
    }

    /// Rebuilds the swap chain targets for the current logical size.
    fn create_window_size_dependent_resources(&self) -> MyResult<Resize> {
        let device_dependent = self.device_dependent.borrow();

        // Unbind and drop everything that references the old back buffers.
        unsafe {
            device_dependent.context.OMSetRenderTargets(None, None);
            device_dependent.d2d_context.SetTarget(None);
        }
        // Only the swap chain is kept, the views must be released before ResizeBuffers.
        let previous_swap_chain = self
            .size_dependent
            .borrow_mut()
            .take()
            .map(|previous| previous.swap_chain);
        unsafe { device_dependent.context.Flush() };

        let logical_size = self.logical_size.get();
        let width = (logical_size.width as u32).max(1);
        let height = (logical_size.height as u32).max(1);
        self.output_size.set(Size::new(width as f32, height as f32));

        let swap_chain = match previous_swap_chain {
            Some(swap_chain) => {
                let resized = unsafe {
                    swap_chain.ResizeBuffers(
                        BACK_BUFFER_COUNT,
                        width,
                        height,
                        BACK_BUFFER_FORMAT,
                        DXGI_SWAP_CHAIN_FLAG(0),
                    )
                };
                match resized {
                    Ok(()) => swap_chain,
                    Err(e) if is_device_lost(e.code()) => {
                        warn!("Device lost while resizing the swap chain: {e}");
                        return Ok(Resize::DeviceLost);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => self.create_swap_chain(&device_dependent.device, width, height)?,
        };

        let back_buffer: ID3D11Texture2D = unsafe { swap_chain.GetBuffer(0)? };
        let mut render_target_view = None;
        unsafe {
            device_dependent.device.CreateRenderTargetView(
                &back_buffer,
                None,
                Some(&mut render_target_view),
            )?
        };
        let render_target_view = render_target_view
            .ok_or_else(|| eyre::eyre!("CreateRenderTargetView returned no view"))?;

        let depth_stencil_view = create_depth_stencil_view(&device_dependent.device, width, height)?;

        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: D3D11_MIN_DEPTH,
            MaxDepth: D3D11_MAX_DEPTH,
        };

        // Direct2D draws straight into the swap chain back buffer.
        let bitmap_properties = D2D1_BITMAP_PROPERTIES1 {
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: BACK_BUFFER_FORMAT,
                alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: 96.0,
            dpiY: 96.0,
            bitmapOptions: D2D1_BITMAP_OPTIONS_TARGET | D2D1_BITMAP_OPTIONS_CANNOT_DRAW,
            colorContext: std::mem::ManuallyDrop::new(None),
        };
        let surface: IDXGISurface2 = unsafe { swap_chain.GetBuffer(0)? };
        let d2d_target_bitmap = unsafe {
            device_dependent
                .d2d_context
                .CreateBitmapFromDxgiSurface(&surface, Some(&bitmap_properties))?
        };
        unsafe {
            device_dependent.d2d_context.SetTarget(&d2d_target_bitmap);
            device_dependent
                .d2d_context
                .SetTextAntialiasMode(D2D1_TEXT_ANTIALIAS_MODE_GRAYSCALE);
        }

        *self.size_dependent.borrow_mut() = Some(SizeDependent {
            swap_chain,
            render_target_view,
            depth_stencil_view,
            viewport,
        });
        info!(width, height, "Created window size dependent resources");
        Ok(Resize::Resized)
    }

    fn create_swap_chain(
        &self,
        device: &ID3D11Device,
        width: u32,
        height: u32,
    ) -> MyResult<IDXGISwapChain1> {
        // The factory that created the device owns the swap chain.
        let dxgi_device: IDXGIDevice1 = device.cast()?;
        let adapter = unsafe { dxgi_device.GetAdapter()? };
        let dxgi_factory: IDXGIFactory2 = unsafe { adapter.GetParent()? };

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: BACK_BUFFER_FORMAT,
            Stereo: false.into(),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: BACK_BUFFER_COUNT,
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            AlphaMode: DXGI_ALPHA_MODE_IGNORE,
            Flags: 0,
        };
        let swap_chain =
            unsafe { dxgi_factory.CreateSwapChainForHwnd(device, self.hwnd, &desc, None, None)? };

        // Keep at most one frame queued to reduce latency.
        unsafe { dxgi_device.SetMaximumFrameLatency(1)? };
        Ok(swap_chain)
    }

    /// Recreates the device and everything built on it, notifying `notify`
    /// before and after.
    pub fn handle_device_lost(&self, notify: &mut dyn DeviceNotify) -> MyResult<()> {
        warn!("Handling device lost");
        self.size_dependent.borrow_mut().take();
        notify.on_device_lost();

        {
            let old = self.device_dependent.borrow();
            unsafe {
                old.d2d_context.SetTarget(None);
                old.context.ClearState();
                old.context.Flush();
            }
        }
        let device_dependent = create_device_dependent(&self.options, &self.d2d_factory)?;
        *self.device_dependent.borrow_mut() = device_dependent;

        if self.create_window_size_dependent_resources()? == Resize::DeviceLost {
            return Err(eyre::eyre!("Graphics device removed again while recovering").into());
        }
        notify.on_device_restored()
    }

    /// Logs whatever the DXGI debug layer has queued.
    pub fn print_debug_messages(&self) {
        print_dxgi_debug_messages(self.device_dependent.borrow().info_queue.as_ref());
    }
}

fn create_device_dependent(
    options: &DeviceOptions,
    d2d_factory: &ID2D1Factory1,
) -> MyResult<DeviceDependent> {
    let created = create_device(options)?;

    let dxgi_device: IDXGIDevice = created.device.cast()?;
    let d2d_device = unsafe { d2d_factory.CreateDevice(&dxgi_device)? };
    let d2d_context = unsafe { d2d_device.CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE)? };

    Ok(DeviceDependent {
        device: created.device,
        context: created.context,
        d2d_context,
        info_queue: created.info_queue,
    })
}

fn create_depth_stencil_view(
    device: &ID3D11Device,
    width: u32,
    height: u32,
) -> MyResult<ID3D11DepthStencilView> {
    let depth_stencil_desc = D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DEPTH_BUFFER_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
        CPUAccessFlags: 0,
        MiscFlags: 0,
    };
    let mut depth_stencil = None;
    unsafe { device.CreateTexture2D(&depth_stencil_desc, None, Some(&mut depth_stencil))? };
    let depth_stencil =
        depth_stencil.ok_or_else(|| eyre::eyre!("CreateTexture2D returned no texture"))?;

    let view_desc = D3D11_DEPTH_STENCIL_VIEW_DESC {
        Format: DEPTH_BUFFER_FORMAT,
        ViewDimension: D3D11_DSV_DIMENSION_TEXTURE2D,
        Flags: 0,
        Anonymous: D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
            Texture2D: D3D11_TEX2D_DSV { MipSlice: 0 },
        },
    };
    let mut depth_stencil_view = None;
    unsafe {
        device.CreateDepthStencilView(&depth_stencil, Some(&view_desc), Some(&mut depth_stencil_view))?
    };
    Ok(depth_stencil_view.ok_or_else(|| eyre::eyre!("CreateDepthStencilView returned no view"))?)
}

fn client_size(hwnd: HWND) -> MyResult<Size> {
    let mut rect = RECT::default();
    unsafe { GetClientRect(hwnd, &mut rect)? };
    Ok(Size::new(
        (rect.right - rect.left) as f32,
        (rect.bottom - rect.top) as f32,
    ))
}

fn is_device_lost(code: HRESULT) -> bool {
    code == DXGI_ERROR_DEVICE_REMOVED || code == DXGI_ERROR_DEVICE_RESET
}

impl DeviceResources for D3D11DeviceResources {
    type Device = D3D11Device;
    type Context = D3D11Context;
    type Draw2D = D3D11Drawing2D;

    fn d3d_device(&self) -> D3D11Device {
        D3D11Device(self.device_dependent.borrow().device.clone())
    }

    fn d3d_context(&self) -> D3D11Context {
        D3D11Context(self.device_dependent.borrow().context.clone())
    }

    fn d2d(&self) -> D3D11Drawing2D {
        D3D11Drawing2D {
            d2d_factory: self.d2d_factory.clone(),
            dwrite_factory: self.dwrite_factory.clone(),
            d2d_context: self.device_dependent.borrow().d2d_context.clone(),
        }
    }

    fn output_size(&self) -> Size {
        self.output_size.get()
    }

    fn logical_size(&self) -> Size {
        self.logical_size.get()
    }

    fn orientation_transform_3d(&self) -> Mat4 {
        self.orientation.get().transform_3d()
    }

    fn orientation_transform_2d(&self) -> Affine2 {
        self.orientation.get().transform_2d(self.logical_size())
    }

    fn prepare_frame(&self, clear_color: ColorF) {
        let device_dependent = self.device_dependent.borrow();
        let size_dependent = self.size_dependent.borrow();
        let Some(targets) = size_dependent.as_ref() else {
            return;
        };
        let context = &device_dependent.context;
        unsafe {
            context.RSSetViewports(Some(&[targets.viewport]));
            context.OMSetRenderTargets(
                Some(&[Some(targets.render_target_view.clone())]),
                &targets.depth_stencil_view,
            );
            context.ClearRenderTargetView(&targets.render_target_view, &clear_color.to_array());
            context.ClearDepthStencilView(
                &targets.depth_stencil_view,
                (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32,
                1.0,
                0,
            );
        }
    }

    fn present(&self) -> MyResult<Present> {
        let device_dependent = self.device_dependent.borrow();
        let size_dependent = self.size_dependent.borrow();
        let Some(targets) = size_dependent.as_ref() else {
            return Ok(Present::Presented);
        };

        let sync_interval = match self.options.vsync {
            true => 1,
            false => 0,
        };
        let hr = unsafe { targets.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) };

        // The contents of both targets are undefined after a flip-model present.
        if let Ok(context1) = device_dependent.context.cast::<ID3D11DeviceContext1>() {
            unsafe {
                context1.DiscardView(&targets.render_target_view);
                context1.DiscardView(&targets.depth_stencil_view);
            }
        }

        if is_device_lost(hr) {
            if hr == DXGI_ERROR_DEVICE_REMOVED {
                let reason = unsafe { device_dependent.device.GetDeviceRemovedReason() };
                warn!("Device removed: {reason:?}");
            }
            return Ok(Present::DeviceLost);
        }
        hr.ok()?;
        Ok(Present::Presented)
    }
}
