//! Surface-to-remote coordinate mapping for the viewer input path.
//!
//! The presentation surface shows the remote frame scaled to fit
//! with preserved aspect ratio, centred with letterboxing. Pointer
//! events arrive in surface coordinates and must be mapped back to
//! the server's raw frame space before a `MOUSE_*` command can be
//! built. Until the first frame has been displayed the remote
//! dimensions are unknown and the mapping is degenerate — no
//! command is produced.

/// Precomputed transform from surface coordinates to remote frame
/// coordinates for one (surface size, frame size) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMapping {
    scaled_w: f64,
    scaled_h: f64,
    offset_x: f64,
    offset_y: f64,
    frame_w: u32,
    frame_h: u32,
}

impl SurfaceMapping {
    /// Build a mapping, or `None` when either rectangle is degenerate
    /// (no frame displayed yet, or a zero-sized surface).
    pub fn new(surface_w: u32, surface_h: u32, frame_w: u32, frame_h: u32) -> Option<Self> {
        if surface_w == 0 || surface_h == 0 || frame_w == 0 || frame_h == 0 {
            return None;
        }

        let scale = f64::min(
            surface_w as f64 / frame_w as f64,
            surface_h as f64 / frame_h as f64,
        );
        let scaled_w = frame_w as f64 * scale;
        let scaled_h = frame_h as f64 * scale;

        Some(Self {
            scaled_w,
            scaled_h,
            offset_x: (surface_w as f64 - scaled_w) / 2.0,
            offset_y: (surface_h as f64 - scaled_h) / 2.0,
            frame_w,
            frame_h,
        })
    }

    /// Map a surface-space pointer position to remote frame space,
    /// clamped to `[0, dimension - 1]` per axis. Positions in the
    /// letterbox bars clamp onto the nearest frame edge.
    pub fn map(&self, x: f64, y: f64) -> (i32, i32) {
        let fx = (x - self.offset_x) * self.frame_w as f64 / self.scaled_w;
        let fy = (y - self.offset_y) * self.frame_h as f64 / self.scaled_h;

        (
            (fx as i32).clamp(0, self.frame_w as i32 - 1),
            (fy as i32).clamp(0, self.frame_h as i32 - 1),
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_until_first_frame() {
        assert!(SurfaceMapping::new(800, 600, 0, 0).is_none());
        assert!(SurfaceMapping::new(0, 600, 1920, 1080).is_none());
    }

    #[test]
    fn identity_when_sizes_match() {
        let m = SurfaceMapping::new(1920, 1080, 1920, 1080).unwrap();
        assert_eq!(m.map(0.0, 0.0), (0, 0));
        assert_eq!(m.map(960.0, 540.0), (960, 540));
        assert_eq!(m.map(1919.0, 1079.0), (1919, 1079));
    }

    #[test]
    fn downscaled_surface_scales_back_up() {
        // 1920x1080 frame shown on a 960x540 surface: exact 2x.
        let m = SurfaceMapping::new(960, 540, 1920, 1080).unwrap();
        assert_eq!(m.map(480.0, 270.0), (960, 540));
        assert_eq!(m.map(100.0, 50.0), (200, 100));
    }

    #[test]
    fn letterbox_offsets_are_subtracted() {
        // 16:9 frame in a square surface: bars above and below,
        // scaled image is 400x225 at y offset 87.5.
        let m = SurfaceMapping::new(400, 400, 1920, 1080).unwrap();
        assert_eq!(m.map(0.0, 87.5), (0, 0));
        assert_eq!(m.map(200.0, 200.0), (960, 540));
    }

    #[test]
    fn clamps_to_frame_bounds() {
        let m = SurfaceMapping::new(400, 400, 1920, 1080).unwrap();
        // Pointer in the top letterbox bar clamps to the frame edge.
        assert_eq!(m.map(200.0, 0.0).1, 0);
        // Pointer past the right edge clamps to width - 1.
        assert_eq!(m.map(5000.0, 200.0).0, 1919);
        assert_eq!(m.map(-50.0, 200.0).0, 0);
    }
}
