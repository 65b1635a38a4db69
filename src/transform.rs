//! Image space to machine space mapping.

/// 2D affine transformation matrix [a, b, c, d, e, f]
/// Represents: | a  c  e |
///             | b  d  f |
///             | 0  0  1 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XForm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for XForm {
    fn default() -> Self {
        Self::identity()
    }
}

impl XForm {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        let mut xf = Self::identity();
        xf.set_translation(x, y);
        xf
    }

    pub fn rotation(degrees: f64) -> Self {
        let mut xf = Self::identity();
        xf.set_rotation(degrees);
        xf
    }

    /// Reset to identity
    pub fn clear(&mut self) {
        *self = Self::identity();
    }

    /// Replace the linear part with a pure rotation, keeping the offset.
    /// Positive angles turn the +X axis towards -Y.
    pub fn set_rotation(&mut self, degrees: f64) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.a = cos;
        self.c = sin;
        self.b = -sin;
        self.d = cos;
    }

    /// Replace the offset, keeping the linear part.
    pub fn set_translation(&mut self, x: f64, y: f64) {
        self.e = x;
        self.f = y;
    }

    /// Transform a point
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// The two-stage placement used for every emitted coordinate: the image is
/// shifted first, then rotated about the machine origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub translate: XForm,
    pub rotate: XForm,
}

impl Placement {
    pub fn new(translate_x: f64, translate_y: f64, rotation_degrees: f64) -> Self {
        Self {
            translate: XForm::translation(translate_x, translate_y),
            rotate: XForm::rotation(rotation_degrees),
        }
    }

    /// rotate(translate(point))
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (tx, ty) = self.translate.transform_point(x, y);
        self.rotate.transform_point(tx, ty)
    }
}

/// Placement plus the raster grid: maps a (column, row) sample to machine
/// coordinates. Row 0 is the top of the engraved area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineFrame {
    pub placement: Placement,
    /// Distance between dots, mm
    pub step_over: f64,
    /// Engraved height, mm
    pub height_mm: f64,
}

impl MachineFrame {
    pub fn point(&self, col: u32, row: u32) -> (f64, f64) {
        self.placement.apply(
            col as f64 * self.step_over,
            self.height_mm - row as f64 * self.step_over,
        )
    }

    /// Image top-left corner
    pub fn origin(&self) -> (f64, f64) {
        self.placement.apply(0.0, self.height_mm)
    }
}
