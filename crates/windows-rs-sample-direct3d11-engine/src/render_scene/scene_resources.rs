use bytemuck::Pod;
use bytemuck::Zeroable;

use crate::device_resources::GraphicsDevice;
use crate::device_resources::InputElement;
use crate::device_resources::VertexFormat;

/// Constant buffer layout shared with `SampleVertexShader.hlsl`.
///
/// Both matrices are stored transposed, HLSL reads constant buffers column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ModelViewProjectionConstantBuffer {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPosition {
    pub pos: [f32; 3],
}

pub static TRIANGLE_VERTICES: [VertexPosition; 3] = [
    VertexPosition {
        pos: [-1.0, 0.0, 0.5],
    },
    VertexPosition {
        pos: [0.0, 1.0, 0.5],
    },
    VertexPosition {
        pos: [1.0, 0.0, 0.5],
    },
];

pub static TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

pub const VERTEX_DESC: [InputElement; 1] = [InputElement {
    semantic_name: c"POSITION",
    semantic_index: 0,
    format: VertexFormat::Float3,
    input_slot: 0,
    aligned_byte_offset: 0,
}];

/// Everything the scene needs on the GPU. Only ever exists as a complete set.
pub struct SceneResources<D: GraphicsDevice> {
    pub vertex_shader: D::VertexShader,
    pub input_layout: D::InputLayout,
    pub pixel_shader: D::PixelShader,
    pub constant_buffer: D::Buffer,
    pub vertex_buffer: D::Buffer,
    pub index_buffer: D::Buffer,
    pub index_count: u32,
}
