//! Recording implementation of the device traits, used by the unit tests.

use bevy_math::Affine2;
use bevy_math::Mat4;
use bevy_math::Vec2;
use parking_lot::Condvar;
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::device_resources::*;
use crate::orientation::DisplayOrientation;
use crate::shader_source::ShaderSource;
use crate::windy_error::MyResult;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateVertexShader { len: usize },
    CreateInputLayout { elements: usize },
    CreatePixelShader { len: usize },
    CreateBuffer(BufferDesc),
    UpdateSubresource { buffer: u64, len: usize },
    SetInputLayout(u64),
    SetVertexBuffer { slot: u32, buffer: u64, stride: u32, offset: u32 },
    SetIndexBuffer { buffer: u64, format: IndexFormat, offset: u32 },
    SetPrimitiveTopology(PrimitiveTopology),
    SetVertexShader(u64),
    SetVsConstantBuffer { slot: u32, buffer: u64 },
    SetPixelShader(u64),
    DrawIndexed { index_count: u32, start_index: u32, base_vertex: i32 },

    CreateTextFormat(TextFormatDesc),
    SetTextAlignment(TextAlignment),
    SetParagraphAlignment(ParagraphAlignment),
    CreateTextLayout { text: String, max_width: f32, max_height: f32 },
    CreateDrawingStateBlock,
    CreateBrush(ColorF),
    SaveDrawingState,
    RestoreDrawingState,
    BeginDraw,
    SetTransform(Affine2),
    DrawTextLayout { text: String, origin: Vec2, brush: u64 },
    EndDraw,

    PrepareFrame(ColorF),
    Present,
}

impl Call {
    pub fn is_draw(&self) -> bool {
        matches!(self, Call::DrawIndexed { .. } | Call::DrawTextLayout { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndDrawMode {
    Drawn,
    RecreateTarget,
    Fail,
}

#[derive(Debug, PartialEq)]
pub struct MockObject {
    pub id: u64,
}

#[derive(Debug)]
pub struct MockTextLayout {
    pub id: u64,
    pub text: String,
    pub max_width: f32,
    pub max_height: f32,
}

struct Recorder {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    failing: Mutex<Vec<&'static str>>,
    failing_buffers: Mutex<Vec<BufferKind>>,
    end_draw: Mutex<EndDrawMode>,
}

/// Implements all three device capabilities and records every call.
#[derive(Clone)]
pub struct RecordingDevice {
    inner: Arc<Recorder>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self {
            inner: Arc::new(Recorder {
                calls: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                failing: Mutex::new(Vec::new()),
                failing_buffers: Mutex::new(Vec::new()),
                end_draw: Mutex::new(EndDrawMode::Drawn),
            }),
        }
    }
}

impl RecordingDevice {
    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.inner.calls.lock().clear();
    }

    pub fn draw_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_draw).collect()
    }

    /// Make every later call of the named operation fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.inner.failing.lock().push(operation);
    }

    /// Make every later buffer creation of this kind fail.
    pub fn fail_on_buffer(&self, kind: BufferKind) {
        self.inner.failing_buffers.lock().push(kind);
    }

    pub fn clear_failures(&self) {
        self.inner.failing.lock().clear();
        self.inner.failing_buffers.lock().clear();
    }

    pub fn set_end_draw(&self, mode: EndDrawMode) {
        *self.inner.end_draw.lock() = mode;
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().push(call);
    }

    fn check(&self, operation: &'static str) -> MyResult<()> {
        if self.inner.failing.lock().contains(&operation) {
            return Err(eyre::eyre!("{operation} failed (E_FAIL)").into());
        }
        Ok(())
    }

    fn object(&self) -> MockObject {
        MockObject {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl GraphicsDevice for RecordingDevice {
    type VertexShader = MockObject;
    type PixelShader = MockObject;
    type InputLayout = MockObject;
    type Buffer = MockObject;

    fn create_vertex_shader(&self, bytecode: &[u8]) -> MyResult<MockObject> {
        self.check("CreateVertexShader")?;
        self.record(Call::CreateVertexShader { len: bytecode.len() });
        Ok(self.object())
    }

    fn create_input_layout(
        &self,
        elements: &[InputElement],
        _vertex_shader_bytecode: &[u8],
    ) -> MyResult<MockObject> {
        self.check("CreateInputLayout")?;
        self.record(Call::CreateInputLayout {
            elements: elements.len(),
        });
        Ok(self.object())
    }

    fn create_pixel_shader(&self, bytecode: &[u8]) -> MyResult<MockObject> {
        self.check("CreatePixelShader")?;
        self.record(Call::CreatePixelShader { len: bytecode.len() });
        Ok(self.object())
    }

    fn create_buffer(&self, desc: BufferDesc, _initial_data: Option<&[u8]>) -> MyResult<MockObject> {
        self.check("CreateBuffer")?;
        if self.inner.failing_buffers.lock().contains(&desc.kind) {
            return Err(eyre::eyre!("CreateBuffer({:?}) failed (E_OUTOFMEMORY)", desc.kind).into());
        }
        self.record(Call::CreateBuffer(desc));
        Ok(self.object())
    }
}

impl GraphicsContext<RecordingDevice> for RecordingDevice {
    fn update_subresource(&self, buffer: &MockObject, data: &[u8]) {
        self.record(Call::UpdateSubresource {
            buffer: buffer.id,
            len: data.len(),
        });
    }

    fn ia_set_input_layout(&self, layout: &MockObject) {
        self.record(Call::SetInputLayout(layout.id));
    }

    fn ia_set_vertex_buffer(&self, slot: u32, buffer: &MockObject, stride: u32, offset: u32) {
        self.record(Call::SetVertexBuffer {
            slot,
            buffer: buffer.id,
            stride,
            offset,
        });
    }

    fn ia_set_index_buffer(&self, buffer: &MockObject, format: IndexFormat, offset: u32) {
        self.record(Call::SetIndexBuffer {
            buffer: buffer.id,
            format,
            offset,
        });
    }

    fn ia_set_primitive_topology(&self, topology: PrimitiveTopology) {
        self.record(Call::SetPrimitiveTopology(topology));
    }

    fn vs_set_shader(&self, shader: &MockObject) {
        self.record(Call::SetVertexShader(shader.id));
    }

    fn vs_set_constant_buffer(&self, slot: u32, buffer: &MockObject) {
        self.record(Call::SetVsConstantBuffer {
            slot,
            buffer: buffer.id,
        });
    }

    fn ps_set_shader(&self, shader: &MockObject) {
        self.record(Call::SetPixelShader(shader.id));
    }

    fn draw_indexed(&self, index_count: u32, start_index_location: u32, base_vertex_location: i32) {
        self.record(Call::DrawIndexed {
            index_count,
            start_index: start_index_location,
            base_vertex: base_vertex_location,
        });
    }
}

impl Drawing2D for RecordingDevice {
    type TextFormat = MockObject;
    type TextLayout = MockTextLayout;
    type Brush = MockObject;
    type StateBlock = MockObject;

    fn create_text_format(&self, desc: &TextFormatDesc) -> MyResult<MockObject> {
        self.check("CreateTextFormat")?;
        self.record(Call::CreateTextFormat(*desc));
        Ok(self.object())
    }

    fn set_text_alignment(&self, _format: &MockObject, alignment: TextAlignment) -> MyResult<()> {
        self.check("SetTextAlignment")?;
        self.record(Call::SetTextAlignment(alignment));
        Ok(())
    }

    fn set_paragraph_alignment(
        &self,
        _format: &MockObject,
        alignment: ParagraphAlignment,
    ) -> MyResult<()> {
        self.check("SetParagraphAlignment")?;
        self.record(Call::SetParagraphAlignment(alignment));
        Ok(())
    }

    fn create_text_layout(
        &self,
        text: &str,
        _format: &MockObject,
        max_width: f32,
        max_height: f32,
    ) -> MyResult<MockTextLayout> {
        self.check("CreateTextLayout")?;
        self.record(Call::CreateTextLayout {
            text: text.to_owned(),
            max_width,
            max_height,
        });
        Ok(MockTextLayout {
            id: self.object().id,
            text: text.to_owned(),
            max_width,
            max_height,
        })
    }

    fn text_metrics(&self, layout: &MockTextLayout) -> MyResult<TextMetrics> {
        // 10 DIPs per character, one 20 DIP line.
        Ok(TextMetrics {
            left: layout.max_width - 10.0 * layout.text.chars().count() as f32,
            top: 0.0,
            width: 10.0 * layout.text.chars().count() as f32,
            height: 20.0,
            layout_width: layout.max_width,
            layout_height: layout.max_height,
        })
    }

    fn create_drawing_state_block(&self) -> MyResult<MockObject> {
        self.check("CreateDrawingStateBlock")?;
        self.record(Call::CreateDrawingStateBlock);
        Ok(self.object())
    }

    fn create_solid_color_brush(&self, color: ColorF) -> MyResult<MockObject> {
        self.check("CreateSolidColorBrush")?;
        self.record(Call::CreateBrush(color));
        Ok(self.object())
    }

    fn save_drawing_state(&self, _block: &MockObject) {
        self.record(Call::SaveDrawingState);
    }

    fn restore_drawing_state(&self, _block: &MockObject) {
        self.record(Call::RestoreDrawingState);
    }

    fn begin_draw(&self) {
        self.record(Call::BeginDraw);
    }

    fn set_transform(&self, transform: Affine2) {
        self.record(Call::SetTransform(transform));
    }

    fn draw_text_layout(&self, origin: Vec2, layout: &MockTextLayout, brush: &MockObject) {
        self.record(Call::DrawTextLayout {
            text: layout.text.clone(),
            origin,
            brush: brush.id,
        });
    }

    fn end_draw(&self) -> MyResult<EndDraw> {
        self.record(Call::EndDraw);
        match *self.inner.end_draw.lock() {
            EndDrawMode::Drawn => Ok(EndDraw::Drawn),
            EndDrawMode::RecreateTarget => Ok(EndDraw::RecreateTarget),
            EndDrawMode::Fail => Err(eyre::eyre!("EndDraw failed (E_OUTOFMEMORY)").into()),
        }
    }
}

/// Device resources backed by a [`RecordingDevice`] with a settable output.
pub struct TestResources {
    pub device: RecordingDevice,
    output_size: Cell<Size>,
    orientation: Cell<DisplayOrientation>,
    device_lost_on_present: Cell<bool>,
}

impl TestResources {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            device: RecordingDevice::default(),
            output_size: Cell::new(Size::new(width, height)),
            orientation: Cell::new(DisplayOrientation::Identity),
            device_lost_on_present: Cell::new(false),
        }
    }

    pub fn set_output_size(&self, width: f32, height: f32) {
        self.output_size.set(Size::new(width, height));
    }

    pub fn set_orientation(&self, orientation: DisplayOrientation) {
        self.orientation.set(orientation);
    }

    pub fn lose_device_on_present(&self) {
        self.device_lost_on_present.set(true);
    }
}

impl DeviceResources for TestResources {
    type Device = RecordingDevice;
    type Context = RecordingDevice;
    type Draw2D = RecordingDevice;

    fn d3d_device(&self) -> RecordingDevice {
        self.device.clone()
    }

    fn d3d_context(&self) -> RecordingDevice {
        self.device.clone()
    }

    fn d2d(&self) -> RecordingDevice {
        self.device.clone()
    }

    fn output_size(&self) -> Size {
        self.output_size.get()
    }

    // 96 DPI: logical and physical pixels coincide.
    fn logical_size(&self) -> Size {
        self.output_size.get()
    }

    fn orientation_transform_3d(&self) -> Mat4 {
        self.orientation.get().transform_3d()
    }

    fn orientation_transform_2d(&self) -> Affine2 {
        self.orientation.get().transform_2d(self.logical_size())
    }

    fn prepare_frame(&self, clear_color: ColorF) {
        self.device.record(Call::PrepareFrame(clear_color));
    }

    fn present(&self) -> MyResult<Present> {
        self.device.record(Call::Present);
        if self.device_lost_on_present.replace(false) {
            return Ok(Present::DeviceLost);
        }
        Ok(Present::Presented)
    }
}

/// In-memory shader binaries whose reads block until [`GatedShaders::open`] is called.
pub struct GatedShaders {
    open: Mutex<bool>,
    opened: Condvar,
    missing: Option<&'static str>,
    reads: AtomicUsize,
}

impl GatedShaders {
    pub fn open_now() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(true),
            opened: Condvar::new(),
            missing: None,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            opened: Condvar::new(),
            missing: None,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn without(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(true),
            opened: Condvar::new(),
            missing: Some(name),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ShaderSource for GatedShaders {
    fn read_data(&self, name: &str) -> MyResult<Vec<u8>> {
        {
            let mut open = self.open.lock();
            while !*open {
                self.opened.wait(&mut open);
            }
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.missing == Some(name) {
            return Err(eyre::eyre!("{name} not found").into());
        }
        Ok(name.as_bytes().to_vec())
    }
}
