use crate::appearance::AppearanceConfig;
use crate::catalog::DeviceFrame;
use crate::clip::{self, Clip};
use crate::content;
use crate::error::{FrameshotError, FrameshotResult};
use crate::geometry::{self, Bounds};
use crate::output;
use crate::raster::Raster;

/// Generation stamp captured when a rebuild starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTicket(u64);

/// Outcome of handing a rebuilt surface back to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Present {
    Presented,
    /// Inputs changed while the rebuild ran; the surface was discarded and
    /// the previously presented one stays current.
    Stale,
}

/// A device frame with its decoded raster and resolved screen geometry.
///
/// Geometry is resolved once at load time; appearance changes never touch
/// it.
#[derive(Clone, Debug)]
pub struct LoadedFrame {
    pub meta: DeviceFrame,
    pub raster: Raster,
    pub bounds: Bounds,
    pub clip: Clip,
}

/// Compose pipeline state: inputs, a monotonic generation counter, and the
/// most recently presented surface.
///
/// Every input change bumps the generation. A rebuild captures a
/// [`RenderTicket`] up front and presents against it, so a rebuild that
/// raced a newer input change is discarded instead of overwriting fresher
/// output.
#[derive(Debug, Default)]
pub struct RenderSession {
    frame: Option<LoadedFrame>,
    screenshot: Option<Raster>,
    background: Option<Raster>,
    appearance: AppearanceConfig,
    generation: u64,
    surface: Option<Raster>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a device frame and resolve its screen geometry.
    pub fn load_frame(&mut self, meta: DeviceFrame, raster: Raster) {
        let bounds = geometry::resolve_bounds(&meta, &raster);
        let clip = clip::select_clip(&meta, &raster, bounds);
        tracing::debug!(
            filename = %meta.filename,
            ?bounds,
            ?clip,
            "resolved frame geometry"
        );
        self.frame = Some(LoadedFrame {
            meta,
            raster,
            bounds,
            clip,
        });
        self.generation += 1;
    }

    pub fn clear_frame(&mut self) {
        self.frame = None;
        self.generation += 1;
    }

    pub fn set_screenshot(&mut self, screenshot: Option<Raster>) {
        self.screenshot = screenshot;
        self.generation += 1;
    }

    pub fn set_background_image(&mut self, background: Option<Raster>) {
        self.background = background;
        self.generation += 1;
    }

    /// Replace the appearance config. Rejected configs leave the session
    /// untouched.
    pub fn set_appearance(&mut self, appearance: AppearanceConfig) -> FrameshotResult<()> {
        appearance.validate()?;
        self.appearance = appearance;
        self.generation += 1;
        Ok(())
    }

    pub fn appearance(&self) -> &AppearanceConfig {
        &self.appearance
    }

    pub fn frame(&self) -> Option<&LoadedFrame> {
        self.frame.as_ref()
    }

    /// Stamp the start of a rebuild.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.generation)
    }

    /// Build a fresh output surface from the current inputs. Pure with
    /// respect to session state.
    pub fn compose(&self) -> FrameshotResult<Raster> {
        let content = if self.appearance.frameless {
            content::build_frameless(
                self.screenshot.as_ref(),
                self.appearance.rotation,
                self.appearance.corner_radius_px,
            )?
        } else {
            let frame = self.frame.as_ref().ok_or_else(|| {
                FrameshotError::config("framed compose requires a loaded device frame")
            })?;
            content::build_framed(&frame.raster, &frame.clip, self.screenshot.as_ref())?
        };
        output::compose(&content, &self.appearance, self.background.as_ref())
    }

    /// Present a rebuilt surface, unless the session moved on in the
    /// meantime.
    pub fn present(&mut self, ticket: RenderTicket, surface: Raster) -> Present {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                generation = self.generation,
                "discarding stale surface"
            );
            return Present::Stale;
        }
        self.surface = Some(surface);
        Present::Presented
    }

    /// Rebuild and present in one step.
    ///
    /// On error the previously presented surface stays current, so a
    /// failed rebuild degrades to stale-but-consistent output.
    pub fn render(&mut self) -> FrameshotResult<&Raster> {
        let ticket = self.begin();
        let surface = self.compose()?;
        self.present(ticket, surface);
        self.surface
            .as_ref()
            .ok_or_else(|| FrameshotError::compose("no surface was presented"))
    }

    pub fn current(&self) -> Option<&Raster> {
        self.surface.as_ref()
    }
}
