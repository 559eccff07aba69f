//! Applying the viewport transform to the render surface.
//!
//! The graph view mounts its surface some time after a workspace is
//! committed. Transform requests made before that are held by the
//! [`SurfaceGate`], latest request wins, and flushed once when the view
//! reports [`SurfaceGate::surface_ready`]. A surface that never shows up
//! simply never receives the transform.

use ng_core::ViewTransform;

/// Something that can display the graph under a viewport transform.
pub trait RenderSurface {
    /// Apply `transform`. The scale is already clamped.
    fn apply_transform(&mut self, transform: ViewTransform) -> Result<(), String>;
}

#[derive(Default)]
pub struct SurfaceGate {
    surface: Option<Box<dyn RenderSurface>>,
    pending: Option<ViewTransform>,
}

impl SurfaceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    pub fn pending(&self) -> Option<ViewTransform> {
        self.pending
    }

    /// Ask for `transform` to be shown.
    ///
    /// Returns `true` when it was applied right away. Strings that are not a
    /// `translate(x,y) scale(k)` pair are ignored.
    pub fn request(&mut self, transform: &str) -> bool {
        let parsed = match ViewTransform::parse(transform) {
            Ok(t) => t.clamped(),
            Err(e) => {
                log::debug!("transform not applied: {e}");
                return false;
            }
        };
        match self.surface.as_mut() {
            Some(surface) => apply(surface.as_mut(), parsed),
            None => {
                log::debug!("surface not ready, holding {parsed}");
                self.pending = Some(parsed);
                false
            }
        }
    }

    /// Attach the mounted surface and flush the pending transform, if any.
    pub fn surface_ready(&mut self, mut surface: Box<dyn RenderSurface>) {
        if let Some(pending) = self.pending.take() {
            apply(surface.as_mut(), pending);
        }
        self.surface = Some(surface);
    }

    /// Detach the surface, e.g. while the graph view re-mounts.
    pub fn surface_lost(&mut self) {
        self.surface = None;
    }
}

fn apply(surface: &mut dyn RenderSurface, transform: ViewTransform) -> bool {
    match surface.apply_transform(transform) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("applying {transform} failed: {e}");
            false
        }
    }
}
