//! Shape generation for 2D primitives
//!
//! Everything is emitted as triangle lists in screen pixels, top-left origin.

use super::vertex::Vertex;

/// Axis-aligned filled rectangle from its top-left corner
pub fn rect(out: &mut Vec<Vertex>, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
    quad(out, x, y, w, h, color, color);
}

/// Rectangle centered on (cx, cy)
pub fn rect_centered(out: &mut Vec<Vertex>, cx: f32, cy: f32, w: f32, h: f32, color: [f32; 4]) {
    rect(out, cx - w / 2.0, cy - h / 2.0, w, h, color);
}

/// Quad with its top edge in `top` and bottom edge in `bottom`
fn quad(
    out: &mut Vec<Vertex>,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    top: [f32; 4],
    bottom: [f32; 4],
) {
    let (x0, y0, x1, y1) = (x, y, x + w, y + h);
    out.push(Vertex::new(x0, y0, top));
    out.push(Vertex::new(x0, y1, bottom));
    out.push(Vertex::new(x1, y0, top));

    out.push(Vertex::new(x1, y0, top));
    out.push(Vertex::new(x0, y1, bottom));
    out.push(Vertex::new(x1, y1, bottom));
}

/// Vertical linear gradient; `stops` are (fraction of height, color), ascending
pub fn vertical_gradient(
    out: &mut Vec<Vertex>,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    stops: &[(f32, [f32; 4])],
) {
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t1 <= t0 {
            continue;
        }
        quad(out, x, y + h * t0, w, h * (t1 - t0), c0, c1);
    }
}

/// Dashed vertical line centered on `x`
///
/// The pattern starts at `-offset` and repeats every `dash + gap`; dashes
/// are clipped to [0, bottom].
pub fn dashed_vline(
    out: &mut Vec<Vertex>,
    x: f32,
    width: f32,
    bottom: f32,
    dash: f32,
    gap: f32,
    offset: f32,
    color: [f32; 4],
) {
    let period = dash + gap;
    if period <= 0.0 || dash <= 0.0 {
        return;
    }
    let left = x - width / 2.0;
    let mut start = -offset;
    while start < bottom {
        let top = start.max(0.0);
        let end = (start + dash).min(bottom);
        if end > top {
            rect(out, left, top, width, end - top, color);
        }
        start += period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    fn extent(verts: &[Vertex]) -> (f32, f32, f32, f32) {
        let xs = verts.iter().map(|v| v.position[0]);
        let ys = verts.iter().map(|v| v.position[1]);
        (
            xs.clone().fold(f32::MAX, f32::min),
            ys.clone().fold(f32::MAX, f32::min),
            xs.fold(f32::MIN, f32::max),
            ys.fold(f32::MIN, f32::max),
        )
    }

    #[test]
    fn test_rect_two_triangles() {
        let mut out = Vec::new();
        rect(&mut out, 10.0, 20.0, 30.0, 40.0, RED);
        assert_eq!(out.len(), 6);
        assert_eq!(extent(&out), (10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_rect_centered() {
        let mut out = Vec::new();
        rect_centered(&mut out, 100.0, 500.0, 60.0, 120.0, RED);
        assert_eq!(extent(&out), (70.0, 440.0, 130.0, 560.0));
    }

    #[test]
    fn test_gradient_bands() {
        let mut out = Vec::new();
        let stops = [(0.0, RED), (0.3, BLUE), (1.0, BLUE)];
        vertical_gradient(&mut out, 0.0, 0.0, 10.0, 100.0, &stops);
        assert_eq!(out.len(), 12);
        // First band ends at 30% with the second stop's color
        let band_bottom: Vec<_> = out[..6].iter().filter(|v| v.position[1] == 30.0).collect();
        assert!(band_bottom.iter().all(|v| v.color == BLUE));
        assert_eq!(out[0].color, RED);
    }

    #[test]
    fn test_dashes_clipped_to_surface() {
        let mut out = Vec::new();
        dashed_vline(&mut out, 50.0, 4.0, 200.0, 30.0, 40.0, 10.0, RED);
        let (x0, y0, x1, y1) = extent(&out);
        assert_eq!((x0, x1), (48.0, 52.0));
        assert!(y0 >= 0.0 && y1 <= 200.0);
        // Dashes start at -10, 60, 130; the first is clipped to [0, 20]
        assert_eq!(out.len(), 18);
        assert_eq!(out[1].position[1], 20.0);
    }

    #[test]
    fn test_dash_offset_shifts_pattern() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        dashed_vline(&mut a, 0.0, 4.0, 500.0, 30.0, 40.0, 0.0, RED);
        dashed_vline(&mut b, 0.0, 4.0, 500.0, 30.0, 40.0, 35.0, RED);
        assert_ne!(a, b);
    }
}
