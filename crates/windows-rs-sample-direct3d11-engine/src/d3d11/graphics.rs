use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::device_resources::BufferDesc;
use crate::device_resources::BufferKind;
use crate::device_resources::GraphicsContext;
use crate::device_resources::GraphicsDevice;
use crate::device_resources::IndexFormat;
use crate::device_resources::InputElement;
use crate::device_resources::PrimitiveTopology;
use crate::device_resources::VertexFormat;
use crate::windy_error::MyResult;

/// Wraps a device child so it can be created on a loader thread and handed to
/// the render thread.
///
/// `ID3D11Device` and the immutable objects it creates are free threaded.
/// The immediate context is not, and is never wrapped.
macro_rules! free_threaded {
    ($name:ident, $interface:ty) => {
        #[derive(Clone, Debug)]
        pub struct $name(pub $interface);

        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}
    };
}

free_threaded!(D3D11VertexShader, ID3D11VertexShader);
free_threaded!(D3D11PixelShader, ID3D11PixelShader);
free_threaded!(D3D11InputLayout, ID3D11InputLayout);
free_threaded!(D3D11Buffer, ID3D11Buffer);
free_threaded!(D3D11Device, ID3D11Device);

fn created<T>(object: Option<T>, what: &str) -> MyResult<T> {
    object.ok_or_else(|| eyre::eyre!("{what} returned success without an object").into())
}

impl GraphicsDevice for D3D11Device {
    type VertexShader = D3D11VertexShader;
    type PixelShader = D3D11PixelShader;
    type InputLayout = D3D11InputLayout;
    type Buffer = D3D11Buffer;

    fn create_vertex_shader(&self, bytecode: &[u8]) -> MyResult<D3D11VertexShader> {
        let mut vertex_shader = None;
        unsafe { self.0.CreateVertexShader(bytecode, None, Some(&mut vertex_shader))? };
        Ok(D3D11VertexShader(created(vertex_shader, "CreateVertexShader")?))
    }

    fn create_input_layout(
        &self,
        elements: &[InputElement],
        vertex_shader_bytecode: &[u8],
    ) -> MyResult<D3D11InputLayout> {
        let descs = elements
            .iter()
            .map(|element| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(element.semantic_name.as_ptr().cast()),
                SemanticIndex: element.semantic_index,
                Format: match element.format {
                    VertexFormat::Float3 => DXGI_FORMAT_R32G32B32_FLOAT,
                },
                InputSlot: element.input_slot,
                AlignedByteOffset: element.aligned_byte_offset,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect::<Vec<_>>();

        let mut input_layout = None;
        unsafe {
            self.0
                .CreateInputLayout(&descs, vertex_shader_bytecode, Some(&mut input_layout))?
        };
        Ok(D3D11InputLayout(created(input_layout, "CreateInputLayout")?))
    }

    fn create_pixel_shader(&self, bytecode: &[u8]) -> MyResult<D3D11PixelShader> {
        let mut pixel_shader = None;
        unsafe { self.0.CreatePixelShader(bytecode, None, Some(&mut pixel_shader))? };
        Ok(D3D11PixelShader(created(pixel_shader, "CreatePixelShader")?))
    }

    fn create_buffer(&self, desc: BufferDesc, initial_data: Option<&[u8]>) -> MyResult<D3D11Buffer> {
        let bind_flags = match desc.kind {
            BufferKind::Vertex => D3D11_BIND_VERTEX_BUFFER,
            BufferKind::Index => D3D11_BIND_INDEX_BUFFER,
            BufferKind::Constant => D3D11_BIND_CONSTANT_BUFFER,
        };
        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: desc.byte_width,
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind_flags.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let subresource = initial_data.map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });

        let mut buffer = None;
        unsafe {
            self.0.CreateBuffer(
                &buffer_desc,
                subresource.as_ref().map(|s| s as *const _),
                Some(&mut buffer),
            )?
        };
        Ok(D3D11Buffer(created(buffer, "CreateBuffer")?))
    }
}

/// The immediate context. Only used on the render thread.
#[derive(Clone)]
pub struct D3D11Context(pub ID3D11DeviceContext);

impl GraphicsContext<D3D11Device> for D3D11Context {
    fn update_subresource(&self, buffer: &D3D11Buffer, data: &[u8]) {
        unsafe {
            self.0
                .UpdateSubresource(&buffer.0, 0, None, data.as_ptr().cast(), 0, 0)
        };
    }

    fn ia_set_input_layout(&self, layout: &D3D11InputLayout) {
        unsafe { self.0.IASetInputLayout(&layout.0) };
    }

    fn ia_set_vertex_buffer(&self, slot: u32, buffer: &D3D11Buffer, stride: u32, offset: u32) {
        unsafe {
            self.0.IASetVertexBuffers(
                slot,
                1,
                Some(&Some(buffer.0.clone())),
                Some(&stride),
                Some(&offset),
            )
        };
    }

    fn ia_set_index_buffer(&self, buffer: &D3D11Buffer, format: IndexFormat, offset: u32) {
        let format = match format {
            IndexFormat::U16 => DXGI_FORMAT_R16_UINT,
        };
        unsafe { self.0.IASetIndexBuffer(&buffer.0, format, offset) };
    }

    fn ia_set_primitive_topology(&self, topology: PrimitiveTopology) {
        let topology = match topology {
            PrimitiveTopology::TriangleList => D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        };
        unsafe { self.0.IASetPrimitiveTopology(topology) };
    }

    fn vs_set_shader(&self, shader: &D3D11VertexShader) {
        unsafe { self.0.VSSetShader(&shader.0, None) };
    }

    fn vs_set_constant_buffer(&self, slot: u32, buffer: &D3D11Buffer) {
        unsafe { self.0.VSSetConstantBuffers(slot, Some(&[Some(buffer.0.clone())])) };
    }

    fn ps_set_shader(&self, shader: &D3D11PixelShader) {
        unsafe { self.0.PSSetShader(&shader.0, None) };
    }

    fn draw_indexed(&self, index_count: u32, start_index_location: u32, base_vertex_location: i32) {
        unsafe {
            self.0
                .DrawIndexed(index_count, start_index_location, base_vertex_location)
        };
    }
}
