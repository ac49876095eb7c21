use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::scene_resources::*;
use crate::device_resources::BufferDesc;
use crate::device_resources::BufferKind;
use crate::device_resources::GraphicsDevice;
use crate::shader_source::ShaderSource;
use crate::shader_source::PIXEL_SHADER_NAME;
use crate::shader_source::VERTEX_SHADER_NAME;
use crate::windy_error::MyResult;

/// Published by the loader, observed by `render` without blocking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading { generation: u64 },
    Loaded { generation: u64 },
    Failed { generation: u64, reason: String },
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded { .. })
    }

    /// Loaded, failed or released: nothing is in flight for the current generation.
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed,
    /// A release or a newer load happened while this one was in flight.
    Discarded,
}

pub(super) struct SceneSlot<D: GraphicsDevice> {
    pub generation: u64,
    pub resources: Option<SceneResources<D>>,
}

/// State shared between the render thread and the loader tasks.
pub(super) struct SceneShared<D: GraphicsDevice> {
    pub slot: Mutex<SceneSlot<D>>,
    pub state: watch::Sender<LoadState>,
}

impl<D: GraphicsDevice> SceneShared<D> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(SceneSlot {
                generation: 0,
                resources: None,
            }),
            state: watch::channel(LoadState::Unloaded).0,
        }
    }

    /// Drops whatever is loaded and starts a new generation.
    pub fn begin_load(&self) -> u64 {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.resources = None;
        self.state.send_replace(LoadState::Loading {
            generation: slot.generation,
        });
        slot.generation
    }

    pub fn release(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.resources = None;
        self.state.send_replace(LoadState::Unloaded);
    }

    fn commit(&self, generation: u64, resources: SceneResources<D>) -> LoadOutcome {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            debug!(
                generation,
                current = slot.generation,
                "Discarding scene resources from a stale load"
            );
            return LoadOutcome::Discarded;
        }
        slot.resources = Some(resources);
        self.state.send_replace(LoadState::Loaded { generation });
        info!(generation, "Scene resources loaded");
        LoadOutcome::Committed
    }

    fn fail(&self, generation: u64, reason: String) {
        let slot = self.slot.lock();
        if slot.generation == generation {
            self.state
                .send_replace(LoadState::Failed { generation, reason });
        }
    }
}

/// Handle to an in-flight scene load. Dropping it detaches the load.
pub struct SceneLoad {
    pub(super) task: JoinHandle<MyResult<LoadOutcome>>,
}

impl SceneLoad {
    pub async fn join(self) -> MyResult<LoadOutcome> {
        self.task.await?
    }

    /// Fire and forget; completion is observable through the scene's load state.
    pub fn detach(self) {
        // Dropping a JoinHandle leaves the task running.
        drop(self.task);
    }
}

pub(super) async fn load_scene<D: GraphicsDevice>(
    device: D,
    shaders: Arc<dyn ShaderSource>,
    shared: Arc<SceneShared<D>>,
    generation: u64,
) -> MyResult<LoadOutcome> {
    match create_scene_resources(device, shaders).await {
        Ok(resources) => Ok(shared.commit(generation, resources)),
        Err(e) => {
            error!(generation, "Failed to load scene resources: {e:?}");
            shared.fail(generation, e.to_string());
            Err(e)
        }
    }
}

async fn create_scene_resources<D: GraphicsDevice>(
    device: D,
    shaders: Arc<dyn ShaderSource>,
) -> MyResult<SceneResources<D>> {
    let create_vs_task = tokio::task::spawn_blocking({
        let device = device.clone();
        let shaders = shaders.clone();
        move || create_vertex_stage(&device, shaders.as_ref())
    });
    let create_ps_task = tokio::task::spawn_blocking({
        let device = device.clone();
        move || create_pixel_stage(&device, shaders.as_ref())
    });

    // The triangle is only built once both shader branches are done.
    let ((vertex_shader, input_layout), (pixel_shader, constant_buffer)) =
        tokio::try_join!(stage(create_vs_task), stage(create_ps_task))?;

    let (vertex_buffer, index_buffer) =
        stage(tokio::task::spawn_blocking(move || create_triangle(&device))).await?;

    Ok(SceneResources {
        vertex_shader,
        input_layout,
        pixel_shader,
        constant_buffer,
        vertex_buffer,
        index_buffer,
        index_count: TRIANGLE_INDICES.len() as u32,
    })
}

async fn stage<T>(task: JoinHandle<MyResult<T>>) -> MyResult<T> {
    task.await?
}

fn create_vertex_stage<D: GraphicsDevice>(
    device: &D,
    shaders: &dyn ShaderSource,
) -> MyResult<(D::VertexShader, D::InputLayout)> {
    let file_data = shaders.read_data(VERTEX_SHADER_NAME)?;
    let vertex_shader = device.create_vertex_shader(&file_data)?;
    let input_layout = device.create_input_layout(&VERTEX_DESC, &file_data)?;
    Ok((vertex_shader, input_layout))
}

fn create_pixel_stage<D: GraphicsDevice>(
    device: &D,
    shaders: &dyn ShaderSource,
) -> MyResult<(D::PixelShader, D::Buffer)> {
    let file_data = shaders.read_data(PIXEL_SHADER_NAME)?;
    let pixel_shader = device.create_pixel_shader(&file_data)?;
    let constant_buffer = device.create_buffer(
        BufferDesc {
            kind: BufferKind::Constant,
            byte_width: std::mem::size_of::<ModelViewProjectionConstantBuffer>() as u32,
        },
        None,
    )?;
    Ok((pixel_shader, constant_buffer))
}

fn create_triangle<D: GraphicsDevice>(device: &D) -> MyResult<(D::Buffer, D::Buffer)> {
    let vertex_bytes: &[u8] = bytemuck::cast_slice(TRIANGLE_VERTICES.as_slice());
    let vertex_buffer = device.create_buffer(
        BufferDesc {
            kind: BufferKind::Vertex,
            byte_width: vertex_bytes.len() as u32,
        },
        Some(vertex_bytes),
    )?;

    let index_bytes: &[u8] = bytemuck::cast_slice(TRIANGLE_INDICES.as_slice());
    let index_buffer = device.create_buffer(
        BufferDesc {
            kind: BufferKind::Index,
            byte_width: index_bytes.len() as u32,
        },
        Some(index_bytes),
    )?;

    Ok((vertex_buffer, index_buffer))
}
