use crate::braille::BrailleCanvas;

/// Fill a circle centred on a surface point (heat blobs).
/// Only the part overlapping the canvas is drawn.
pub fn fill_circle(canvas: &mut BrailleCanvas, cx: f32, cy: f32, radius: f32) {
    if !cx.is_finite() || !cy.is_finite() || radius < 0.0 {
        return;
    }
    let r = radius.round() as i32;
    let cx = cx.round();
    let cy = cy.round();

    // Skip blobs entirely off the canvas before touching i32 conversions
    let w = canvas.pixel_width() as f32;
    let h = canvas.pixel_height() as f32;
    if cx + radius < 0.0 || cy + radius < 0.0 || cx - radius >= w || cy - radius >= h {
        return;
    }
    let (cx, cy) = (cx as i32, cy as i32);

    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a point marker (small cross)
pub fn draw_marker(canvas: &mut BrailleCanvas, x: f32, y: f32, size: i32) {
    if !x.is_finite() || !y.is_finite() {
        return;
    }
    let (x, y) = (x.round() as i32, y.round() as i32);
    for i in -size..=size {
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}
