/// Page dimensions in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both sides multiplied by `scale`
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            width: self.width * scale,
            height: self.height * scale,
        }
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Pixel dimensions when rendered at `zoom` pixels per point
    pub fn pixels_at(&self, zoom: f32) -> (u32, u32) {
        let w = (self.width * zoom).round().max(1.0) as u32;
        let h = (self.height * zoom).round().max(1.0) as u32;
        (w, h)
    }
}
