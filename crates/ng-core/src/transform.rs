//! Viewport transform: `translate(x,y) scale(k)`.
//!
//! The graph view stores its pan/zoom state as the SVG transform string it
//! sets on `#main_graph`. This module parses that string with `winnow`,
//! re-emits it, clamps the scale for the render surface, and inverts it to
//! find the visible region in graph coordinates.

use std::fmt;
use winnow::ascii::{digit1, space0};
use winnow::combinator::{opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// The transform of an untouched viewport.
pub const IDENTITY_TRANSFORM: &str = "translate(0,0) scale(1)";

/// Smallest zoom factor the render surface accepts.
pub const MIN_SCALE: f64 = 0.01;

/// Largest zoom factor the render surface accepts.
pub const MAX_SCALE: f64 = 4.0;

/// A 2D viewport transform: translation followed by uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// Strict parse of `translate(<n>,<n>) scale(<n>)`.
    ///
    /// Whitespace inside the parentheses and between the two functions is
    /// tolerated; anything else is an error.
    pub fn parse(input: &str) -> Result<Self, String> {
        parse_transform
            .parse(input)
            .map_err(|e| format!("Transform parse error: {e}"))
    }

    /// Best-effort parse used for placement math.
    ///
    /// Looks for `translate(x,y)` and `scale(k)` anywhere in the string and
    /// falls back to `(0,0)` and `1` for whichever part is missing or
    /// unreadable.
    pub fn parse_lenient(input: &str) -> Self {
        let (x, y) = input
            .find("translate(")
            .and_then(|at| {
                let mut rest = &input[at + "translate(".len()..];
                parse_pair.parse_next(&mut rest).ok()
            })
            .unwrap_or((0.0, 0.0));
        let k = input
            .find("scale(")
            .and_then(|at| {
                let mut rest = &input[at + "scale(".len()..];
                parse_single.parse_next(&mut rest).ok()
            })
            .unwrap_or(1.0);
        Self { x, y, k }
    }

    /// Copy with the scale clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn clamped(self) -> Self {
        let k = if self.k.is_nan() {
            1.0
        } else {
            self.k.clamp(MIN_SCALE, MAX_SCALE)
        };
        Self { k, ..self }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Scale used when inverting; a zero or NaN scale counts as 1.
    fn divisor(&self) -> f64 {
        if self.k == 0.0 || self.k.is_nan() {
            1.0
        } else {
            self.k
        }
    }

    /// Left edge of the visible region in graph coordinates.
    pub fn view_left(&self) -> f64 {
        -self.x / self.divisor()
    }

    /// Top edge of the visible region in graph coordinates.
    pub fn view_top(&self) -> f64 {
        -self.y / self.divisor()
    }

    /// Horizontal center of a viewport `width` screen pixels wide.
    pub fn view_center_x(&self, width: f64) -> f64 {
        (-self.x + width / 2.0) / self.divisor()
    }
}

impl fmt::Display for ViewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn parse_transform(input: &mut &str) -> ModalResult<ViewTransform> {
    let _ = space0.parse_next(input)?;
    let _ = "translate(".parse_next(input)?;
    let (x, y) = parse_pair.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = "scale(".parse_next(input)?;
    let k = parse_single.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    Ok(ViewTransform { x, y, k })
}

/// `<n>,<n>)`: the tail of a `translate(` call.
fn parse_pair(input: &mut &str) -> ModalResult<(f64, f64)> {
    let _ = space0.parse_next(input)?;
    let x = parse_number.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = ','.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let y = parse_number.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = ')'.parse_next(input)?;
    Ok((x, y))
}

/// `<n>)`: the tail of a `scale(` call.
fn parse_single(input: &mut &str) -> ModalResult<f64> {
    let _ = space0.parse_next(input)?;
    let k = parse_number.parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = ')'.parse_next(input)?;
    Ok(k)
}

/// Decimal number with optional sign, fraction and exponent (`-12.5e-3`).
fn parse_number(input: &mut &str) -> ModalResult<f64> {
    let start = *input;
    let _ = opt(one_of(['-', '+'])).parse_next(input)?;
    let int = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let frac = opt(preceded('.', take_while(0.., |c: char| c.is_ascii_digit())))
        .parse_next(input)?;
    if int.is_empty() && frac.is_none_or(|f: &str| f.is_empty()) {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let _ = opt((one_of(['e', 'E']), opt(one_of(['-', '+'])), digit1)).parse_next(input)?;
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identity() {
        let t = ViewTransform::parse(IDENTITY_TRANSFORM).unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn parse_signed_fractional_values() {
        let t = ViewTransform::parse("translate(-120.5, 48) scale(0.75)").unwrap();
        assert_eq!(t, ViewTransform::new(-120.5, 48.0, 0.75));
    }

    #[test]
    fn parse_exponent() {
        let t = ViewTransform::parse("translate(1e2,-2.5E-1) scale(.5)").unwrap();
        assert_eq!(t, ViewTransform::new(100.0, -0.25, 0.5));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ViewTransform::parse("").is_err());
        assert!(ViewTransform::parse("scale(1)").is_err());
        assert!(ViewTransform::parse("translate(1,2)").is_err());
        assert!(ViewTransform::parse("translate(a,2) scale(1)").is_err());
        assert!(ViewTransform::parse("translate(1,2) scale(1) rotate(4)").is_err());
    }

    #[test]
    fn display_roundtrip() {
        let t = ViewTransform::new(-30.0, 12.25, 1.5);
        assert_eq!(t.to_string(), "translate(-30,12.25) scale(1.5)");
        assert_eq!(ViewTransform::parse(&t.to_string()).unwrap(), t);
        assert_eq!(ViewTransform::IDENTITY.to_string(), IDENTITY_TRANSFORM);
    }

    #[test]
    fn lenient_fills_missing_parts() {
        assert_eq!(
            ViewTransform::parse_lenient("scale(2)"),
            ViewTransform::new(0.0, 0.0, 2.0)
        );
        assert_eq!(
            ViewTransform::parse_lenient("translate(5,6)"),
            ViewTransform::new(5.0, 6.0, 1.0)
        );
        assert_eq!(ViewTransform::parse_lenient("junk"), ViewTransform::IDENTITY);
        assert_eq!(ViewTransform::parse_lenient(""), ViewTransform::IDENTITY);
    }

    #[test]
    fn clamp_scale() {
        assert_eq!(ViewTransform::new(0.0, 0.0, 10.0).clamped().k, MAX_SCALE);
        assert_eq!(ViewTransform::new(0.0, 0.0, 0.0).clamped().k, MIN_SCALE);
        assert_eq!(ViewTransform::new(3.0, 4.0, 2.0).clamped(), ViewTransform::new(3.0, 4.0, 2.0));
    }

    #[test]
    fn inverted_viewport_edges() {
        let t = ViewTransform::new(-200.0, -100.0, 2.0);
        assert_eq!(t.view_left(), 100.0);
        assert_eq!(t.view_top(), 50.0);
        assert_eq!(t.view_center_x(800.0), 300.0);

        let zero = ViewTransform::new(-10.0, -20.0, 0.0);
        assert_eq!(zero.view_left(), 10.0);
        assert_eq!(zero.view_top(), 20.0);
    }
}
