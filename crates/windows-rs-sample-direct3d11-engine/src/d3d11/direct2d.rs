use bevy_math::Affine2;
use bevy_math::Vec2;
use widestring::U16CString;
use widestring::U16String;
use windows::core::PCWSTR;
use windows::Win32::Foundation::D2DERR_RECREATE_TARGET;
use windows::Win32::Graphics::Direct2D::Common::*;
use windows::Win32::Graphics::Direct2D::*;
use windows::Win32::Graphics::DirectWrite::*;
use windows_numerics::Matrix3x2;
use windows_numerics::Vector2;

use crate::device_resources::ColorF;
use crate::device_resources::Drawing2D;
use crate::device_resources::EndDraw;
use crate::device_resources::FontWeight;
use crate::device_resources::ParagraphAlignment;
use crate::device_resources::TextAlignment;
use crate::device_resources::TextFormatDesc;
use crate::device_resources::TextMetrics;
use crate::windy_error::MyResult;

/// Direct2D device context plus the factories text drawing needs.
#[derive(Clone)]
pub struct D3D11Drawing2D {
    pub(super) d2d_factory: ID2D1Factory1,
    pub(super) dwrite_factory: IDWriteFactory,
    pub(super) d2d_context: ID2D1DeviceContext,
}

/// Column-vector affine to Direct2D's row-vector 3x2 matrix.
pub fn to_matrix3x2(transform: Affine2) -> Matrix3x2 {
    let x_axis = transform.matrix2.x_axis;
    let y_axis = transform.matrix2.y_axis;
    Matrix3x2 {
        M11: x_axis.x,
        M12: x_axis.y,
        M21: y_axis.x,
        M22: y_axis.y,
        M31: transform.translation.x,
        M32: transform.translation.y,
    }
}

fn wide(text: &str) -> MyResult<U16CString> {
    U16CString::from_str(text).map_err(|e| eyre::eyre!("{text:?} is not a valid wide string: {e}").into())
}

impl Drawing2D for D3D11Drawing2D {
    type TextFormat = IDWriteTextFormat;
    type TextLayout = IDWriteTextLayout;
    type Brush = ID2D1SolidColorBrush;
    type StateBlock = ID2D1DrawingStateBlock1;

    fn create_text_format(&self, desc: &TextFormatDesc) -> MyResult<IDWriteTextFormat> {
        let font_family = wide(desc.font_family)?;
        let locale = wide(desc.locale)?;
        let weight = match desc.weight {
            FontWeight::Light => DWRITE_FONT_WEIGHT_LIGHT,
            FontWeight::Normal => DWRITE_FONT_WEIGHT_NORMAL,
            FontWeight::Bold => DWRITE_FONT_WEIGHT_BOLD,
        };
        let text_format = unsafe {
            self.dwrite_factory.CreateTextFormat(
                PCWSTR(font_family.as_ptr()),
                None,
                weight,
                DWRITE_FONT_STYLE_NORMAL,
                DWRITE_FONT_STRETCH_NORMAL,
                desc.size,
                PCWSTR(locale.as_ptr()),
            )?
        };
        Ok(text_format)
    }

    fn set_text_alignment(
        &self,
        format: &IDWriteTextFormat,
        alignment: TextAlignment,
    ) -> MyResult<()> {
        let alignment = match alignment {
            TextAlignment::Leading => DWRITE_TEXT_ALIGNMENT_LEADING,
            TextAlignment::Trailing => DWRITE_TEXT_ALIGNMENT_TRAILING,
            TextAlignment::Center => DWRITE_TEXT_ALIGNMENT_CENTER,
        };
        unsafe { format.SetTextAlignment(alignment)? };
        Ok(())
    }

    fn set_paragraph_alignment(
        &self,
        format: &IDWriteTextFormat,
        alignment: ParagraphAlignment,
    ) -> MyResult<()> {
        let alignment = match alignment {
            ParagraphAlignment::Near => DWRITE_PARAGRAPH_ALIGNMENT_NEAR,
            ParagraphAlignment::Far => DWRITE_PARAGRAPH_ALIGNMENT_FAR,
            ParagraphAlignment::Center => DWRITE_PARAGRAPH_ALIGNMENT_CENTER,
        };
        unsafe { format.SetParagraphAlignment(alignment)? };
        Ok(())
    }

    fn create_text_layout(
        &self,
        text: &str,
        format: &IDWriteTextFormat,
        max_width: f32,
        max_height: f32,
    ) -> MyResult<IDWriteTextLayout> {
        let text = U16String::from_str(text);
        let text_layout = unsafe {
            self.dwrite_factory
                .CreateTextLayout(text.as_slice(), format, max_width, max_height)?
        };
        Ok(text_layout)
    }

    fn text_metrics(&self, layout: &IDWriteTextLayout) -> MyResult<TextMetrics> {
        let mut metrics = DWRITE_TEXT_METRICS::default();
        unsafe { layout.GetMetrics(&mut metrics)? };
        Ok(TextMetrics {
            left: metrics.left,
            top: metrics.top,
            width: metrics.width,
            height: metrics.height,
            layout_width: metrics.layoutWidth,
            layout_height: metrics.layoutHeight,
        })
    }

    fn create_drawing_state_block(&self) -> MyResult<ID2D1DrawingStateBlock1> {
        let state_block = unsafe { self.d2d_factory.CreateDrawingStateBlock(None, None)? };
        Ok(state_block)
    }

    fn create_solid_color_brush(&self, color: ColorF) -> MyResult<ID2D1SolidColorBrush> {
        let color = D2D1_COLOR_F {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let brush = unsafe { self.d2d_context.CreateSolidColorBrush(&color, None)? };
        Ok(brush)
    }

    fn save_drawing_state(&self, block: &ID2D1DrawingStateBlock1) {
        unsafe { self.d2d_context.SaveDrawingState(block) };
    }

    fn restore_drawing_state(&self, block: &ID2D1DrawingStateBlock1) {
        unsafe { self.d2d_context.RestoreDrawingState(block) };
    }

    fn begin_draw(&self) {
        unsafe { self.d2d_context.BeginDraw() };
    }

    fn set_transform(&self, transform: Affine2) {
        unsafe { self.d2d_context.SetTransform(&to_matrix3x2(transform)) };
    }

    fn draw_text_layout(&self, origin: Vec2, layout: &IDWriteTextLayout, brush: &ID2D1SolidColorBrush) {
        unsafe {
            self.d2d_context.DrawTextLayout(
                Vector2 {
                    X: origin.x,
                    Y: origin.y,
                },
                layout,
                brush,
                D2D1_DRAW_TEXT_OPTIONS_NONE,
            )
        };
    }

    fn end_draw(&self) -> MyResult<EndDraw> {
        match unsafe { self.d2d_context.EndDraw(None, None) } {
            Ok(()) => Ok(EndDraw::Drawn),
            Err(e) if e.code() == D2DERR_RECREATE_TARGET => Ok(EndDraw::RecreateTarget),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_lands_in_the_third_row() {
        let m = to_matrix3x2(Affine2::from_translation(Vec2::new(784.0, 748.0)));
        assert_eq!((m.M11, m.M12, m.M21, m.M22), (1.0, 0.0, 0.0, 1.0));
        assert_eq!((m.M31, m.M32), (784.0, 748.0));
    }

    #[test]
    fn rotation_matches_direct2d_row_vectors() {
        // Rotating +x by 90 degrees clockwise on screen gives +y.
        let m = to_matrix3x2(Affine2::from_angle(std::f32::consts::FRAC_PI_2));
        assert!((m.M11).abs() < 1e-6);
        assert!((m.M12 - 1.0).abs() < 1e-6);
        assert!((m.M21 + 1.0).abs() < 1e-6);
    }
}
