//! Frames-per-second counter drawn with DirectWrite in the bottom-right corner.

use bevy_math::Affine2;
use bevy_math::Vec2;
use std::rc::Rc;
use tracing::debug;

use crate::device_resources::ColorF;
use crate::device_resources::DeviceResources;
use crate::device_resources::Drawing2D;
use crate::device_resources::EndDraw;
use crate::device_resources::FontWeight;
use crate::device_resources::ParagraphAlignment;
use crate::device_resources::TextAlignment;
use crate::device_resources::TextFormatDesc;
use crate::device_resources::TextMetrics;
use crate::step_timer::StepTimer;
use crate::windy_error::MyResult;

type Draw<R> = <R as DeviceResources>::Draw2D;

pub const FPS_TEXT_FORMAT: TextFormatDesc = TextFormatDesc {
    font_family: "Segoe UI",
    weight: FontWeight::Light,
    size: 32.0,
    locale: "en-US",
};

pub const MAX_LAYOUT_WIDTH: f32 = 240.0;
pub const MAX_LAYOUT_HEIGHT: f32 = 50.0;

/// Text shown for a frame rate. Nothing is shown until the first full second has been measured.
pub fn fps_text(frames_per_second: u32) -> String {
    if frames_per_second > 0 {
        frames_per_second.to_string()
    } else {
        String::new()
    }
}

pub struct RenderFPS<R: DeviceResources> {
    device_resources: Rc<R>,

    text: String,
    text_metrics: TextMetrics,

    // Device independent, survive device loss.
    text_format: <Draw<R> as Drawing2D>::TextFormat,
    state_block: <Draw<R> as Drawing2D>::StateBlock,
    text_layout: Option<<Draw<R> as Drawing2D>::TextLayout>,

    white_brush: Option<<Draw<R> as Drawing2D>::Brush>,
}

impl<R: DeviceResources> RenderFPS<R> {
    pub fn new(device_resources: Rc<R>) -> MyResult<Self> {
        let d2d = device_resources.d2d();

        let text_format = d2d.create_text_format(&FPS_TEXT_FORMAT)?;
        d2d.set_paragraph_alignment(&text_format, ParagraphAlignment::Near)?;
        let state_block = d2d.create_drawing_state_block()?;

        let mut overlay = Self {
            device_resources,
            text: String::new(),
            text_metrics: TextMetrics::default(),
            text_format,
            state_block,
            text_layout: None,
            white_brush: None,
        };
        overlay.create_device_dependent_resources()?;
        Ok(overlay)
    }

    /// Rebuilds the layout from the timer's current frame rate.
    pub fn update(&mut self, timer: &StepTimer) -> MyResult<()> {
        self.text = fps_text(timer.frames_per_second());

        let d2d = self.device_resources.d2d();
        let text_layout = d2d.create_text_layout(
            &self.text,
            &self.text_format,
            MAX_LAYOUT_WIDTH,
            MAX_LAYOUT_HEIGHT,
        )?;
        self.text_metrics = d2d.text_metrics(&text_layout)?;
        self.text_layout = Some(text_layout);
        Ok(())
    }

    pub fn render(&self) -> MyResult<()> {
        let (Some(text_layout), Some(white_brush)) = (&self.text_layout, &self.white_brush) else {
            return Ok(());
        };

        let context = self.device_resources.d2d();
        context.save_drawing_state(&self.state_block);
        context.begin_draw();

        let drawn = self.draw_text(&context, text_layout, white_brush);

        // Ignore D2DERR_RECREATE_TARGET here. The device lost path handles it on present.
        let ended = context.end_draw();
        context.restore_drawing_state(&self.state_block);

        drawn?;
        if ended? == EndDraw::RecreateTarget {
            debug!("Direct2D asked for its target to be recreated");
        }
        Ok(())
    }

    fn draw_text(
        &self,
        context: &Draw<R>,
        text_layout: &<Draw<R> as Drawing2D>::TextLayout,
        white_brush: &<Draw<R> as Drawing2D>::Brush,
    ) -> MyResult<()> {
        // Position on the bottom right corner.
        let logical_size = self.device_resources.logical_size();
        let screen_translation = Affine2::from_translation(Vec2::new(
            logical_size.width - self.text_metrics.layout_width,
            logical_size.height - self.text_metrics.height,
        ));
        context.set_transform(self.device_resources.orientation_transform_2d() * screen_translation);

        context.set_text_alignment(&self.text_format, TextAlignment::Trailing)?;
        context.draw_text_layout(Vec2::ZERO, text_layout, white_brush);
        Ok(())
    }

    pub fn create_device_dependent_resources(&mut self) -> MyResult<()> {
        self.white_brush = Some(
            self.device_resources
                .d2d()
                .create_solid_color_brush(ColorF::WHITE)?,
        );
        Ok(())
    }

    pub fn release_device_dependent_resources(&mut self) {
        self.white_brush = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_metrics(&self) -> TextMetrics {
        self.text_metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::DisplayOrientation;
    use crate::test_device::Call;
    use crate::test_device::EndDrawMode;
    use crate::test_device::TestResources;
    use std::time::Duration;
    use std::time::Instant;

    fn timer_at_61_fps() -> StepTimer {
        let start = Instant::now();
        let mut timer = StepTimer::starting_at(start);
        let mut now = start;
        for _ in 0..61 {
            now += Duration::from_nanos(1_000_000_000 / 60);
            timer.tick_at(now, |_| {});
        }
        assert_eq!(timer.frames_per_second(), 61);
        timer
    }

    fn overlay(resources: &Rc<TestResources>) -> RenderFPS<TestResources> {
        let overlay = RenderFPS::new(resources.clone()).unwrap();
        resources.device.clear();
        overlay
    }

    #[test]
    fn fps_text_is_the_decimal_value() {
        assert_eq!(fps_text(1), "1");
        assert_eq!(fps_text(60), "60");
        assert_eq!(fps_text(144), "144");
    }

    #[test]
    fn zero_fps_shows_nothing() {
        assert_eq!(fps_text(0), "");
    }

    #[test]
    fn construction_creates_format_state_block_and_brush() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        RenderFPS::new(resources.clone()).unwrap();
        assert_eq!(
            resources.device.calls(),
            vec![
                Call::CreateTextFormat(FPS_TEXT_FORMAT),
                Call::SetParagraphAlignment(ParagraphAlignment::Near),
                Call::CreateDrawingStateBlock,
                Call::CreateBrush(ColorF::WHITE),
            ]
        );
    }

    #[test]
    fn render_before_update_draws_nothing() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        overlay(&resources).render().unwrap();
        assert!(resources.device.calls().is_empty());
    }

    #[test]
    fn update_recreates_the_layout_every_call() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        let timer = timer_at_61_fps();

        overlay.update(&timer).unwrap();
        overlay.update(&timer).unwrap();

        let layouts = resources
            .device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::CreateTextLayout { .. }))
            .collect::<Vec<_>>();
        assert_eq!(
            layouts,
            vec![
                Call::CreateTextLayout {
                    text: "61".to_owned(),
                    max_width: MAX_LAYOUT_WIDTH,
                    max_height: MAX_LAYOUT_HEIGHT,
                };
                2
            ]
        );
        assert_eq!(overlay.text(), "61");
        assert_eq!(overlay.text_metrics().width, 20.0);
    }

    #[test]
    fn update_then_render_draws_that_text() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();
        resources.device.clear();

        overlay.render().unwrap();

        let calls = resources.device.calls();
        assert_eq!(calls.len(), 7, "{calls:#?}");
        assert_eq!(calls[0], Call::SaveDrawingState);
        assert_eq!(calls[1], Call::BeginDraw);
        // Layout is 240 wide and one 20 DIP line tall.
        assert_eq!(
            calls[2],
            Call::SetTransform(Affine2::from_translation(Vec2::new(1024.0 - 240.0, 768.0 - 20.0)))
        );
        assert_eq!(calls[3], Call::SetTextAlignment(TextAlignment::Trailing));
        assert!(matches!(
            &calls[4],
            Call::DrawTextLayout { text, origin, .. } if text == "61" && *origin == Vec2::ZERO
        ));
        assert_eq!(calls[5], Call::EndDraw);
        assert_eq!(calls[6], Call::RestoreDrawingState);
    }

    #[test]
    fn fresh_timer_renders_an_empty_layout() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&StepTimer::new()).unwrap();
        overlay.render().unwrap();
        assert!(resources.device.draw_calls().iter().any(|c| matches!(
            c,
            Call::DrawTextLayout { text, .. } if text.is_empty()
        )));
    }

    #[test]
    fn rotated_output_composes_the_orientation_after_the_corner_offset() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        resources.set_orientation(DisplayOrientation::Rotate90);
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();
        resources.device.clear();

        overlay.render().unwrap();

        let expected = DisplayOrientation::Rotate90.transform_2d(resources.logical_size())
            * Affine2::from_translation(Vec2::new(1024.0 - 240.0, 768.0 - 20.0));
        assert!(resources.device.calls().contains(&Call::SetTransform(expected)));
    }

    #[test]
    fn recreate_target_is_not_an_error() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();
        resources.device.set_end_draw(EndDrawMode::RecreateTarget);
        resources.device.clear();

        overlay.render().unwrap();
        assert_eq!(resources.device.calls().last(), Some(&Call::RestoreDrawingState));
    }

    #[test]
    fn end_draw_failure_propagates_after_restoring_state() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();
        resources.device.set_end_draw(EndDrawMode::Fail);
        resources.device.clear();

        assert!(overlay.render().is_err());
        assert_eq!(resources.device.calls().last(), Some(&Call::RestoreDrawingState));
    }

    #[test]
    fn alignment_failure_still_ends_the_draw() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();
        resources.device.fail_on("SetTextAlignment");
        resources.device.clear();

        assert!(overlay.render().is_err());
        let calls = resources.device.calls();
        assert!(calls.contains(&Call::EndDraw));
        assert!(!calls.iter().any(Call::is_draw));
    }

    #[test]
    fn brush_follows_the_device_lifecycle() {
        let resources = Rc::new(TestResources::new(1024.0, 768.0));
        let mut overlay = overlay(&resources);
        overlay.update(&timer_at_61_fps()).unwrap();

        overlay.release_device_dependent_resources();
        resources.device.clear();
        overlay.render().unwrap();
        assert!(resources.device.calls().is_empty());

        overlay.create_device_dependent_resources().unwrap();
        overlay.render().unwrap();
        assert_eq!(resources.device.draw_calls().len(), 1);
        // The text format survived, only the brush was recreated.
        assert!(!resources
            .device
            .calls()
            .iter()
            .any(|c| matches!(c, Call::CreateTextFormat(_))));
    }
}
