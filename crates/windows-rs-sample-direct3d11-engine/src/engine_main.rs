use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::info;
use tracing::warn;

use crate::device_resources::ColorF;
use crate::device_resources::DeviceNotify;
use crate::device_resources::DeviceResources;
use crate::device_resources::Present;
use crate::render_fps::RenderFPS;
use crate::render_scene::RenderScene;
use crate::shader_source::ShaderSource;
use crate::step_timer::StepTimer;
use crate::windy_error::MyResult;

/// Renders the triangle scene with the frame counter on top.
pub struct EngineMain<R: DeviceResources> {
    device_resources: Rc<R>,

    scene_renderer: RenderScene<R>,
    fps_text_renderer: RenderFPS<R>,

    timer: StepTimer,
}

impl<R: DeviceResources> EngineMain<R> {
    /// Creates both renderers. The scene starts loading right away.
    pub fn new(
        device_resources: Rc<R>,
        shaders: Arc<dyn ShaderSource>,
        runtime: Handle,
    ) -> MyResult<Self> {
        let scene_renderer = RenderScene::new(device_resources.clone(), shaders, runtime);
        let fps_text_renderer = RenderFPS::new(device_resources.clone())?;

        // Variable step by default. For 60 FPS fixed step updates:
        // timer.set_fixed_time_step(true);
        // timer.set_target_elapsed_seconds(1.0 / 60.0);
        let timer = StepTimer::new();

        Ok(Self {
            device_resources,
            scene_renderer,
            fps_text_renderer,
            timer,
        })
    }

    /// Call when the output size or orientation changed.
    pub fn create_window_size_dependent_resources(&mut self) {
        self.scene_renderer.create_window_size_dependent_resources();
    }

    /// Updates the application state once per frame.
    pub fn update(&mut self) -> MyResult<()> {
        self.update_at(Instant::now())
    }

    pub(crate) fn update_at(&mut self, now: Instant) -> MyResult<()> {
        let mut result = Ok(());
        self.timer.tick_at(now, |timer| {
            self.scene_renderer.update(timer);
            if result.is_ok() {
                result = self.fps_text_renderer.update(timer);
            }
        });
        result
    }

    /// Renders the current frame. Returns true when there is something to present.
    pub fn render(&mut self) -> MyResult<bool> {
        // Don't try to render anything before the first update.
        if self.timer.frame_count() == 0 {
            return Ok(false);
        }

        // Reset the viewport and the render targets, clear them.
        self.device_resources.prepare_frame(ColorF::CORNFLOWER_BLUE);

        self.scene_renderer.render();
        self.fps_text_renderer.render()?;

        Ok(true)
    }

    pub fn present(&self) -> MyResult<Present> {
        let presented = self.device_resources.present()?;
        if presented == Present::DeviceLost {
            warn!("Graphics device removed or reset during present");
        }
        Ok(presented)
    }

    pub fn timer(&self) -> &StepTimer {
        &self.timer
    }

    pub fn scene_renderer(&self) -> &RenderScene<R> {
        &self.scene_renderer
    }

    pub fn fps_text_renderer(&self) -> &RenderFPS<R> {
        &self.fps_text_renderer
    }
}

impl<R: DeviceResources> DeviceNotify for EngineMain<R> {
    fn on_device_lost(&mut self) {
        info!("Releasing device dependent resources");
        self.scene_renderer.release_device_dependent_resources();
        self.fps_text_renderer.release_device_dependent_resources();
    }

    fn on_device_restored(&mut self) -> MyResult<()> {
        info!("Recreating device dependent resources");
        self.scene_renderer.create_device_dependent_resources().detach();
        self.fps_text_renderer.create_device_dependent_resources()?;
        self.create_window_size_dependent_resources();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_scene::LoadState;
    use crate::test_device::Call;
    use crate::test_device::GatedShaders;
    use crate::test_device::TestResources;
    use std::time::Duration;

    fn engine(resources: &Rc<TestResources>) -> EngineMain<TestResources> {
        EngineMain::new(resources.clone(), GatedShaders::open_now(), Handle::current()).unwrap()
    }

    async fn scene_settled(engine: &EngineMain<TestResources>) -> LoadState {
        let mut state = engine.scene_renderer().load_state();
        let settled = state.wait_for(LoadState::is_settled).await.unwrap().clone();
        settled
    }

    #[tokio::test]
    async fn nothing_is_rendered_before_the_first_update() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);
        scene_settled(&engine).await;
        resources.device.clear();

        assert!(!engine.render().unwrap());
        assert!(resources.device.calls().is_empty());
    }

    #[tokio::test]
    async fn frame_clears_then_draws_scene_then_overlay() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);
        assert!(scene_settled(&engine).await.is_loaded());

        engine.update().unwrap();
        resources.device.clear();
        assert!(engine.render().unwrap());

        let calls = resources.device.calls();
        assert_eq!(calls[0], Call::PrepareFrame(ColorF::CORNFLOWER_BLUE));
        let draws = resources.device.draw_calls();
        assert_eq!(draws.len(), 2, "{calls:#?}");
        assert!(matches!(draws[0], Call::DrawIndexed { index_count: 3, .. }));
        assert!(matches!(draws[1], Call::DrawTextLayout { .. }));
    }

    #[tokio::test]
    async fn update_feeds_the_frame_rate_to_the_overlay() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);

        let mut now = Instant::now();
        for _ in 0..70 {
            now += Duration::from_millis(20);
            engine.update_at(now).unwrap();
        }
        // The overlay sees the rate measured up to the previous tick.
        assert_eq!(engine.timer().frames_per_second(), 50);
        assert_eq!(engine.fps_text_renderer().text(), "50");
    }

    #[tokio::test]
    async fn overlay_failure_is_reported_by_update() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);
        resources.device.fail_on("CreateTextLayout");
        assert!(engine.update().is_err());
    }

    #[tokio::test]
    async fn device_lost_stops_drawing_until_restored() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);
        scene_settled(&engine).await;
        engine.update().unwrap();

        resources.lose_device_on_present();
        assert_eq!(engine.present().unwrap(), Present::DeviceLost);
        engine.on_device_lost();

        resources.device.clear();
        assert!(engine.render().unwrap());
        assert_eq!(resources.device.calls(), vec![Call::PrepareFrame(ColorF::CORNFLOWER_BLUE)]);

        engine.on_device_restored().unwrap();
        assert!(scene_settled(&engine).await.is_loaded());
        resources.device.clear();
        engine.render().unwrap();
        assert_eq!(resources.device.draw_calls().len(), 2);
        assert_eq!(engine.present().unwrap(), Present::Presented);
    }

    #[tokio::test]
    async fn resize_recomputes_the_projection() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut engine = engine(&resources);
        let before = engine.scene_renderer().constant_buffer_data().projection;

        resources.set_output_size(600.0, 800.0);
        engine.create_window_size_dependent_resources();
        assert_ne!(before, engine.scene_renderer().constant_buffer_data().projection);
    }
}
