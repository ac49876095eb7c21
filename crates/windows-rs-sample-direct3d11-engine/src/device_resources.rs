//! Capability set the renderers need from the graphics backend.
//!
//! The renderers never see a concrete device. They are handed an
//! `Rc<R: DeviceResources>` and talk to it through the traits below:
//!
//! - [`GraphicsDevice`]: object creation, usable from the background loader
//! - [`GraphicsContext`]: the immediate context, render thread only
//! - [`Drawing2D`]: Direct2D/DirectWrite style text drawing
//! - [`DeviceResources`]: accessors, frame setup, present
//!
//! The Direct3D 11 implementation lives in `crate::d3d11`.

use bevy_math::Affine2;
use bevy_math::Mat4;
use bevy_math::Vec2;
use std::ffi::CStr;

use crate::windy_error::MyResult;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width / self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorF {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorF {
    pub const WHITE: ColorF = ColorF::rgb(1.0, 1.0, 1.0);
    pub const CORNFLOWER_BLUE: ColorF = ColorF::rgb(0.392_156_9, 0.584_313_75, 0.929_411_8);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
    Constant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub kind: BufferKind,
    pub byte_width: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    /// Three 32-bit floats (`DXGI_FORMAT_R32G32B32_FLOAT`).
    Float3,
}

impl VertexFormat {
    pub fn byte_size(self) -> u32 {
        match self {
            VertexFormat::Float3 => 12,
        }
    }
}

/// One entry of an input layout, per-vertex data only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputElement {
    pub semantic_name: &'static CStr,
    pub semantic_index: u32,
    pub format: VertexFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
}

/// Creates GPU objects. Free-threaded: the scene loader calls it from a
/// background task while the render thread keeps drawing.
pub trait GraphicsDevice: Clone + Send + Sync + 'static {
    type VertexShader: Send + Sync + 'static;
    type PixelShader: Send + Sync + 'static;
    type InputLayout: Send + Sync + 'static;
    type Buffer: Send + Sync + 'static;

    fn create_vertex_shader(&self, bytecode: &[u8]) -> MyResult<Self::VertexShader>;

    /// `vertex_shader_bytecode` must be the bytecode the layout will be used with,
    /// the device validates the elements against its input signature.
    fn create_input_layout(
        &self,
        elements: &[InputElement],
        vertex_shader_bytecode: &[u8],
    ) -> MyResult<Self::InputLayout>;

    fn create_pixel_shader(&self, bytecode: &[u8]) -> MyResult<Self::PixelShader>;

    fn create_buffer(&self, desc: BufferDesc, initial_data: Option<&[u8]>)
        -> MyResult<Self::Buffer>;
}

/// The immediate context. Only ever driven from the render thread.
pub trait GraphicsContext<D: GraphicsDevice> {
    fn update_subresource(&self, buffer: &D::Buffer, data: &[u8]);
    fn ia_set_input_layout(&self, layout: &D::InputLayout);
    fn ia_set_vertex_buffer(&self, slot: u32, buffer: &D::Buffer, stride: u32, offset: u32);
    fn ia_set_index_buffer(&self, buffer: &D::Buffer, format: IndexFormat, offset: u32);
    fn ia_set_primitive_topology(&self, topology: PrimitiveTopology);
    fn vs_set_shader(&self, shader: &D::VertexShader);
    fn vs_set_constant_buffer(&self, slot: u32, buffer: &D::Buffer);
    fn ps_set_shader(&self, shader: &D::PixelShader);
    fn draw_indexed(&self, index_count: u32, start_index_location: u32, base_vertex_location: i32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Light,
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlignment {
    Leading,
    Trailing,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphAlignment {
    Near,
    Far,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextFormatDesc {
    pub font_family: &'static str,
    pub weight: FontWeight,
    pub size: f32,
    pub locale: &'static str,
}

/// Subset of `DWRITE_TEXT_METRICS` the overlay positions itself with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub layout_width: f32,
    pub layout_height: f32,
}

/// Result of ending a 2-D draw pass that did not fail outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndDraw {
    Drawn,
    /// The target must be recreated. Recovery happens through the device-lost
    /// path, so callers treat this as success.
    RecreateTarget,
}

/// 2-D drawing and text services (Direct2D + DirectWrite).
pub trait Drawing2D {
    type TextFormat;
    type TextLayout;
    type Brush;
    type StateBlock;

    fn create_text_format(&self, desc: &TextFormatDesc) -> MyResult<Self::TextFormat>;
    fn set_text_alignment(&self, format: &Self::TextFormat, alignment: TextAlignment)
        -> MyResult<()>;
    fn set_paragraph_alignment(
        &self,
        format: &Self::TextFormat,
        alignment: ParagraphAlignment,
    ) -> MyResult<()>;
    fn create_text_layout(
        &self,
        text: &str,
        format: &Self::TextFormat,
        max_width: f32,
        max_height: f32,
    ) -> MyResult<Self::TextLayout>;
    fn text_metrics(&self, layout: &Self::TextLayout) -> MyResult<TextMetrics>;
    fn create_drawing_state_block(&self) -> MyResult<Self::StateBlock>;
    fn create_solid_color_brush(&self, color: ColorF) -> MyResult<Self::Brush>;

    fn save_drawing_state(&self, block: &Self::StateBlock);
    fn restore_drawing_state(&self, block: &Self::StateBlock);
    fn begin_draw(&self);
    fn set_transform(&self, transform: Affine2);
    fn draw_text_layout(&self, origin: Vec2, layout: &Self::TextLayout, brush: &Self::Brush);
    fn end_draw(&self) -> MyResult<EndDraw>;
}

/// Outcome of presenting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Present {
    Presented,
    /// The device was removed or reset; run the device-lost cycle.
    DeviceLost,
}

/// Shared owner of the device, context, swap chain and factories.
///
/// Accessors hand out cheap handles (reference-counted COM pointers on
/// Windows) so callers never hold a borrow across a device reset.
pub trait DeviceResources: 'static {
    type Device: GraphicsDevice;
    type Context: GraphicsContext<Self::Device>;
    type Draw2D: Drawing2D;

    fn d3d_device(&self) -> Self::Device;
    fn d3d_context(&self) -> Self::Context;
    fn d2d(&self) -> Self::Draw2D;

    /// Render target size in pixels.
    fn output_size(&self) -> Size;
    /// Window size in device-independent pixels.
    fn logical_size(&self) -> Size;
    fn orientation_transform_3d(&self) -> Mat4;
    fn orientation_transform_2d(&self) -> Affine2;

    /// Sets the viewport, binds back buffer and depth stencil, clears both.
    fn prepare_frame(&self, clear_color: ColorF);
    fn present(&self) -> MyResult<Present>;
}

/// Receives device lost/restored notifications from the device owner.
pub trait DeviceNotify {
    fn on_device_lost(&mut self);
    fn on_device_restored(&mut self) -> MyResult<()>;
}
