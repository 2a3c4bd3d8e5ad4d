/// Last known pointer position in normalized surface coordinates.
///
/// The origin is the bottom-left corner so it lines up with shader `uv`
/// space; client coordinates arrive with a top-left origin and are flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    position: [f32; 2],
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: [0.5, 0.5],
        }
    }
}

impl PointerState {
    /// Normalizes a client-space position against the surface dimensions
    /// supplied at call time. Returns `false` and keeps the previous position
    /// when the dimensions or coordinates are unusable.
    pub fn handle_move(&mut self, client_x: f64, client_y: f64, width: f64, height: f64) -> bool {
        let usable = |value: f64| value.is_finite() && value > 0.0;
        if !usable(width) || !usable(height) || !client_x.is_finite() || !client_y.is_finite() {
            return false;
        }

        let x = (client_x / width).clamp(0.0, 1.0);
        let y = (1.0 - client_y / height).clamp(0.0, 1.0);
        self.position = [x as f32, y as f32];
        true
    }

    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
