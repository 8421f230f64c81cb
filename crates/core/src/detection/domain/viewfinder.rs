//! Maps detector-native rectangles into viewfinder coordinates.
//!
//! Detectors report boxes normalized to the upright image with a bottom-left
//! origin. The viewfinder shows that image scaled by a gravity rule and,
//! for the front camera, mirrored. The evaluator only ever sees the result.

use crate::shared::capture_settings::CameraSide;
use crate::shared::rect::{require_positive_size, GeometryError, Rect};

/// How the camera image is fitted into the view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gravity {
    /// Scale to cover the view, cropping the overflow.
    #[default]
    ResizeAspectFill,
    /// Scale to fit inside the view, letterboxing the remainder.
    ResizeAspect,
    /// Stretch to the view bounds, ignoring aspect ratio.
    Resize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewfinder {
    width: f64,
    height: f64,
    gravity: Gravity,
    mirrored: bool,
}

impl Viewfinder {
    pub fn new(width: f64, height: f64) -> Result<Self, GeometryError> {
        require_positive_size("viewfinder", width, height)?;
        Ok(Self {
            width,
            height,
            gravity: Gravity::default(),
            mirrored: false,
        })
    }

    /// Front camera previews are mirrored so the subject sees themselves as in a mirror.
    pub fn for_camera_side(
        width: f64,
        height: f64,
        side: CameraSide,
    ) -> Result<Self, GeometryError> {
        Ok(Self::new(width, height)?.with_mirrored(side == CameraSide::Front))
    }

    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    /// Converts a normalized, bottom-left-origin rectangle in the upright
    /// image of `image_size` pixels into integral view coordinates.
    pub fn map_normalized_rect(&self, rect: Rect, image_size: (u32, u32)) -> Rect {
        let mut nx = rect.x;
        let ny = 1.0 - rect.y - rect.height;
        if self.mirrored {
            nx = 1.0 - nx - rect.width;
        }

        let (left, top, shown_w, shown_h) = self.displayed_image(image_size);
        Rect::new(
            left + nx * shown_w,
            top + ny * shown_h,
            rect.width * shown_w,
            rect.height * shown_h,
        )
        .integral()
    }

    /// Origin and size of the image as displayed inside the view.
    fn displayed_image(&self, (image_w, image_h): (u32, u32)) -> (f64, f64, f64, f64) {
        if image_w == 0 || image_h == 0 {
            return (0.0, 0.0, self.width, self.height);
        }
        let (iw, ih) = (image_w as f64, image_h as f64);
        let sx = self.width / iw;
        let sy = self.height / ih;
        let scale = match self.gravity {
            Gravity::Resize => return (0.0, 0.0, self.width, self.height),
            Gravity::ResizeAspectFill => sx.max(sy),
            Gravity::ResizeAspect => sx.min(sy),
        };
        let shown_w = iw * scale;
        let shown_h = ih * scale;
        (
            (self.width - shown_w) / 2.0,
            (self.height - shown_h) / 2.0,
            shown_w,
            shown_h,
        )
    }
}
