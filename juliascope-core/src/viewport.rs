use tracing::warn;

use crate::complex::Complex;
use crate::error::CoreError;

/// Smallest permitted zoom, in pixels per plane unit.
///
/// Below this the whole interesting region collapses to a fraction of a
/// pixel and further zooming out is pointless; clamping here also keeps
/// the tile-grid arithmetic well away from overflow.
pub const MIN_ZOOM: f64 = 1e-3;

/// Defines the visible window into the complex plane.
///
/// The viewport is centred on `center`, with `zoom` giving how many screen
/// pixels one complex-plane unit spans. This is the reciprocal of a
/// units-per-pixel scale; the wire protocol transmits zoom directly, so it
/// is stored in that form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Centre of the viewport in the complex plane.
    pub center: Complex,

    /// Pixels per complex-plane unit. Always `>= MIN_ZOOM` and finite.
    pub zoom: f64,

    /// Viewport width in pixels.
    pub width: u32,

    /// Viewport height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Default view: centred on the origin with `|z| < 2.2` visible, which
    /// comfortably frames both Julia sets and the Mandelbrot set.
    pub fn default_view(width: u32, height: u32) -> Self {
        let extent = 4.4; // 4.0 + padding
        let zoom = (width as f64 / extent)
            .min(height as f64 / extent)
            .max(MIN_ZOOM);
        Self {
            center: Complex::ZERO,
            zoom,
            width,
            height,
        }
    }

    /// Create a viewport with explicit parameters.
    pub fn new(center: Complex, zoom: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if zoom < MIN_ZOOM || !zoom.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("zoom must be finite and >= {MIN_ZOOM}, got {zoom}"),
            });
        }
        if !center.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: "center must be finite".into(),
            });
        }
        Ok(Self {
            center,
            zoom,
            width,
            height,
        })
    }

    /// Map fractional pixel coordinates to a complex-plane point.
    ///
    /// `(0, 0)` is the top-left pixel corner. The y-axis is flipped so that
    /// increasing pixel-y moves downward (decreasing imaginary part).
    #[inline]
    pub fn pixel_to_plane(&self, px: f64, py: f64) -> Complex {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        Complex::new(
            self.center.re + (px - half_w) / self.zoom,
            self.center.im - (py - half_h) / self.zoom,
        )
    }

    /// Map a complex-plane point to fractional pixel coordinates.
    ///
    /// Inverse of [`pixel_to_plane`](Self::pixel_to_plane) up to
    /// floating-point tolerance. Points outside the canvas map to
    /// coordinates outside `[0, width) × [0, height)`; no clipping.
    #[inline]
    pub fn plane_to_pixel(&self, point: Complex) -> (f64, f64) {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        (
            (point.re - self.center.re) * self.zoom + half_w,
            (self.center.im - point.im) * self.zoom + half_h,
        )
    }

    /// Zoom by `factor` while keeping the plane point under the cursor
    /// fixed on screen.
    ///
    /// The point currently under `(px, py)` is computed, the zoom is
    /// rescaled (and clamped), and the centre is solved so the same plane
    /// point sits under the cursor afterwards. A non-finite solve (deep
    /// accumulated float error) leaves the viewport unchanged.
    pub fn zoom_about_cursor(&mut self, px: f64, py: f64, factor: f64) {
        let anchor = self.pixel_to_plane(px, py);
        let new_zoom = (self.zoom * factor).max(MIN_ZOOM);

        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        let new_center = Complex::new(
            anchor.re - (px - half_w) / new_zoom,
            anchor.im + (py - half_h) / new_zoom,
        );
        if !new_center.is_finite() {
            warn!("Discarding zoom step: centre solve produced a non-finite value");
            return;
        }
        self.center = new_center;
        self.zoom = new_zoom;
    }

    /// Shift the centre by a screen-space pixel delta.
    ///
    /// Dragging content rightward/downward (`dx`, `dy` positive) moves the
    /// centre left/up in the plane.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        let new_center = Complex::new(
            self.center.re - dx / self.zoom,
            self.center.im + dy / self.zoom,
        );
        if new_center.is_finite() {
            self.center = new_center;
        }
    }

    /// The total extent of the viewport in complex-plane units.
    pub fn plane_width(&self) -> f64 {
        self.width as f64 / self.zoom
    }

    /// The total extent of the viewport in complex-plane units.
    pub fn plane_height(&self) -> f64 {
        self.height as f64 / self.zoom
    }
}
