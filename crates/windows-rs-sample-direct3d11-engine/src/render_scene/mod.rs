//! Renders one static triangle through the Direct3D 11 pipeline.

pub mod load_scene;
pub mod render;
pub mod scene_resources;
pub mod window_size;

use std::rc::Rc;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

use crate::device_resources::DeviceResources;
use crate::shader_source::ShaderSource;
use crate::step_timer::StepTimer;

use load_scene::load_scene;
use load_scene::SceneShared;
pub use load_scene::LoadOutcome;
pub use load_scene::LoadState;
pub use load_scene::SceneLoad;
use scene_resources::ModelViewProjectionConstantBuffer;

pub struct RenderScene<R: DeviceResources> {
    device_resources: Rc<R>,
    shaders: Arc<dyn ShaderSource>,
    runtime: Handle,
    shared: Arc<SceneShared<R::Device>>,
    constant_buffer_data: ModelViewProjectionConstantBuffer,
}

impl<R: DeviceResources> RenderScene<R> {
    /// Starts loading the scene in the background and computes the
    /// window-size-dependent matrices.
    pub fn new(device_resources: Rc<R>, shaders: Arc<dyn ShaderSource>, runtime: Handle) -> Self {
        let mut scene = Self::without_resources(device_resources, shaders, runtime);
        scene.create_device_dependent_resources().detach();
        scene.create_window_size_dependent_resources();
        scene
    }

    /// A scene in the Unloaded state, nothing started.
    pub fn without_resources(
        device_resources: Rc<R>,
        shaders: Arc<dyn ShaderSource>,
        runtime: Handle,
    ) -> Self {
        Self {
            device_resources,
            shaders,
            runtime,
            shared: Arc::new(SceneShared::new()),
            constant_buffer_data: ModelViewProjectionConstantBuffer::default(),
        }
    }

    /// Loads both shaders and builds the triangle on the runtime's worker threads.
    ///
    /// Anything previously loaded is dropped right away; drawing resumes once the
    /// returned load commits. Loads started earlier are superseded and will
    /// discard their results.
    pub fn create_device_dependent_resources(&mut self) -> SceneLoad {
        let generation = self.shared.begin_load();
        debug!(generation, "Loading scene resources");
        let task = self.runtime.spawn(load_scene(
            self.device_resources.d3d_device(),
            self.shaders.clone(),
            self.shared.clone(),
            generation,
        ));
        SceneLoad { task }
    }

    /// Recomputes projection and view. Only overwrites the two matrices.
    pub fn create_window_size_dependent_resources(&mut self) {
        let output_size = self.device_resources.output_size();
        let orientation = self.device_resources.orientation_transform_3d();

        self.constant_buffer_data.projection =
            window_size::to_shader_layout(window_size::projection_matrix(output_size, orientation));
        self.constant_buffer_data.view = window_size::to_shader_layout(window_size::view_matrix());
    }

    /// Safe to call at any time, including when nothing was ever created.
    pub fn release_device_dependent_resources(&mut self) {
        self.shared.release();
    }

    pub fn update(&mut self, _timer: &StepTimer) {}

    pub fn is_loading_complete(&self) -> bool {
        self.shared.state.borrow().is_loaded()
    }

    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.shared.state.subscribe()
    }

    pub fn constant_buffer_data(&self) -> &ModelViewProjectionConstantBuffer {
        &self.constant_buffer_data
    }
}
