use crate::device_resources::DeviceResources;
use crate::device_resources::GraphicsContext;
use crate::device_resources::IndexFormat;
use crate::device_resources::PrimitiveTopology;

use super::scene_resources::VertexPosition;
use super::RenderScene;

impl<R: DeviceResources> RenderScene<R> {
    /// Draws the triangle. Does nothing until every scene resource has been loaded.
    pub fn render(&self) {
        // Loading is asynchronous, only draw geometry once it is complete.
        if !self.is_loading_complete() {
            return;
        }

        let slot = self.shared.slot.lock();
        let Some(resources) = slot.resources.as_ref() else {
            return;
        };

        let context = self.device_resources.d3d_context();

        // Prepare the constant buffer to send it to the graphics device.
        context.update_subresource(
            &resources.constant_buffer,
            bytemuck::bytes_of(&self.constant_buffer_data),
        );

        context.ia_set_input_layout(&resources.input_layout);

        // Each vertex is one position.
        let stride = std::mem::size_of::<VertexPosition>() as u32;
        context.ia_set_vertex_buffer(0, &resources.vertex_buffer, stride, 0);

        // Each index is one 16-bit unsigned integer (short).
        context.ia_set_index_buffer(&resources.index_buffer, IndexFormat::U16, 0);
        context.ia_set_primitive_topology(PrimitiveTopology::TriangleList);

        context.vs_set_shader(&resources.vertex_shader);
        context.vs_set_constant_buffer(0, &resources.constant_buffer);
        context.ps_set_shader(&resources.pixel_shader);

        context.draw_indexed(resources.index_count, 0, 0);
    }
}
