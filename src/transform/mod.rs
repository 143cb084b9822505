//! Transform engine: paired pixel and point mappings.
//!
//! Every [`Transform`] resolves, for a given source size, to one
//! [`Geometry`]: a forward affine point map plus the output canvas size.
//! Both halves of the pair are derived from it:
//!
//! - [`Transform::map_point`] applies the affine map to a coordinate;
//! - [`Transform::apply_to_image`] warps pixels by sampling through the
//!   inverse of the same map, then applies any photometric adjustment.
//!
//! Because neither mapping has its own formula, they cannot drift apart.
//!
//! | kind                | point map                                        | canvas            |
//! |---------------------|--------------------------------------------------|-------------------|
//! | `rotate(θ)`         | rotate about `(w/2, h/2)`, recentre on new canvas | expanded to fit   |
//! | `flip(horizontal)`  | `(w − x, y)`                                     | unchanged         |
//! | `shear(k)`          | `(x + k·y, y)`, affine `(1, k, 0, 0, 1, 0)`      | unchanged         |
//! | `brightness(f)`     | identity                                         | unchanged         |
//!
//! `flip(vertical)` can be named but has no defined point mapping and is
//! rejected as unsupported by both halves.

mod affine;
mod photometric;
mod warp;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::{ColorType, DynamicImage, RgbaImage};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

pub use affine::Affine;

use crate::error::AugmentError;
use crate::ir::{BBox, Point};

/// Mirror direction for [`Transform::Flip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    Horizontal,
    /// Declared for completeness; has no supported point mapping.
    Vertical,
}

impl FlipDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlipDirection::Horizontal => "horizontal",
            FlipDirection::Vertical => "vertical",
        }
    }
}

impl FromStr for FlipDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(FlipDirection::Horizontal),
            "vertical" | "v" => Ok(FlipDirection::Vertical),
            other => Err(format!(
                "unknown flip direction '{}' (expected horizontal or vertical)",
                other
            )),
        }
    }
}

/// One augmentation operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    /// Rotate by an angle in degrees about the image center, expanding the
    /// canvas to fit.
    Rotate { angle: f64 },
    /// Mirror the image.
    Flip { direction: FlipDirection },
    /// Horizontal shear by `factor`.
    Shear { factor: f64 },
    /// Scale color channels by `factor`.
    Brightness { factor: f64 },
}

/// The shared geometric parameterization of a transform for one source size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Forward map from source coordinates to output coordinates.
    pub affine: Affine,
    /// Output canvas width.
    pub width: u32,
    /// Output canvas height.
    pub height: u32,
}

impl Geometry {
    /// Maps a source point into the output frame.
    #[inline]
    pub fn map_point(&self, p: Point) -> Point {
        self.affine.apply(p)
    }

    fn is_identity_for(&self, width: u32, height: u32) -> bool {
        self.affine == Affine::IDENTITY && self.width == width && self.height == height
    }
}

impl Transform {
    /// Short kind name (`rotate`, `flip`, `shear`, `brightness`).
    pub fn kind(&self) -> &'static str {
        match self {
            Transform::Rotate { .. } => "rotate",
            Transform::Flip { .. } => "flip",
            Transform::Shear { .. } => "shear",
            Transform::Brightness { .. } => "brightness",
        }
    }

    /// Resolves this transform for a `width × height` source.
    ///
    /// # Errors
    /// [`AugmentError::UnsupportedTransform`] for `flip(vertical)`.
    pub fn geometry(&self, width: u32, height: u32) -> Result<Geometry, AugmentError> {
        let (w, h) = (width as f64, height as f64);
        let same_canvas = |affine| Geometry {
            affine,
            width,
            height,
        };

        match *self {
            Transform::Rotate { angle } => {
                let (cx, cy) = (w / 2.0, h / 2.0);
                let rotation = Affine::rotation_about(cx, cy, angle);
                let corners = [
                    Point::new(0.0, 0.0),
                    Point::new(w, 0.0),
                    Point::new(0.0, h),
                    Point::new(w, h),
                ];
                let hull = BBox::envelope(corners.iter().map(|&c| rotation.apply(c)))
                    .unwrap_or_default();
                let out_w = (hull.width.round() as u32).max(1);
                let out_h = (hull.height.round() as u32).max(1);
                let recentre =
                    Affine::translation(out_w as f64 / 2.0 - cx, out_h as f64 / 2.0 - cy);
                Ok(Geometry {
                    affine: rotation.then(&recentre),
                    width: out_w,
                    height: out_h,
                })
            }
            Transform::Flip {
                direction: FlipDirection::Horizontal,
            } => Ok(same_canvas(Affine::new(-1.0, 0.0, w, 0.0, 1.0, 0.0))),
            Transform::Flip {
                direction: FlipDirection::Vertical,
            } => Err(AugmentError::UnsupportedTransform {
                transform: self.to_string(),
                reason: "vertical flips have no defined annotation mapping".into(),
            }),
            Transform::Shear { factor } => {
                Ok(same_canvas(Affine::new(1.0, factor, 0.0, 0.0, 1.0, 0.0)))
            }
            Transform::Brightness { .. } => Ok(same_canvas(Affine::IDENTITY)),
        }
    }

    /// Point half of the pair: maps `p` from a `width × height` source into
    /// the transformed image's frame.
    pub fn map_point(&self, p: Point, width: u32, height: u32) -> Result<Point, AugmentError> {
        Ok(self.geometry(width, height)?.map_point(p))
    }

    /// Pixel half of the pair: returns the transformed image. Its
    /// `width()`/`height()` are the new dimensions.
    ///
    /// The source's color layout is kept (gray stays gray, alpha stays
    /// alpha); sample depth is reduced to 8 bits.
    pub fn apply_to_image(&self, image: &DynamicImage) -> Result<DynamicImage, AugmentError> {
        let geometry = self.geometry(image.width(), image.height())?;
        let rgba = image.to_rgba8();

        let mut buffer = if geometry.is_identity_for(image.width(), image.height()) {
            rgba
        } else {
            warp::warp_rgba(&rgba, &geometry)
        };

        match *self {
            Transform::Brightness { factor } => photometric::scale_brightness(&mut buffer, factor),
            Transform::Rotate { .. } | Transform::Flip { .. } | Transform::Shear { .. } => {}
        }

        Ok(restore_color(buffer, image.color()))
    }

    /// Checks parameters before any work is done.
    pub fn validate(&self) -> Result<(), AugmentError> {
        let invalid = |message: String| AugmentError::InvalidConfig { message };
        match *self {
            Transform::Rotate { angle } if !angle.is_finite() => {
                return Err(invalid(format!("rotate angle must be finite, got {}", angle)))
            }
            Transform::Shear { factor } if !factor.is_finite() => {
                return Err(invalid(format!("shear factor must be finite, got {}", factor)))
            }
            Transform::Brightness { factor } if !(factor.is_finite() && factor >= 0.0) => {
                return Err(invalid(format!(
                    "brightness factor must be a non-negative number, got {}",
                    factor
                )))
            }
            _ => {}
        }
        self.geometry(1, 1).map(|_| ())
    }

    fn from_parts(kind: &str, param: TransformParam) -> Result<Self, String> {
        let kind = kind.trim().to_ascii_lowercase();
        let expected = match kind.as_str() {
            "rotate" => "angle",
            "flip" => "direction",
            "shear" | "brightness" => "factor",
            other => {
                return Err(format!(
                    "unknown transform '{}' (expected rotate, flip, shear or brightness)",
                    other
                ))
            }
        };
        let param = param.unwrap_named(expected)?;

        match (kind.as_str(), param) {
            ("rotate", TransformParam::Number(angle)) => Ok(Transform::Rotate { angle }),
            ("shear", TransformParam::Number(factor)) => Ok(Transform::Shear { factor }),
            ("brightness", TransformParam::Number(factor)) => Ok(Transform::Brightness { factor }),
            ("flip", TransformParam::Word(word)) => Ok(Transform::Flip {
                direction: word.parse()?,
            }),
            (kind, _) => Err(format!("'{}' expects a {} value", kind, expected)),
        }
    }
}

fn restore_color(buffer: RgbaImage, color: ColorType) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(buffer);
    match color {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(rgba.to_luma8()),
        ColorType::La8 | ColorType::La16 => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
            DynamicImage::ImageRgb8(rgba.to_rgb8())
        }
        _ => rgba,
    }
}

// ============================================================================
// Text and serde representations
// ============================================================================

/// Compact form used on the command line and in logs: `rotate:90`,
/// `flip:horizontal`, `shear:0.2`, `brightness:0.8`.
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Rotate { angle } => write!(f, "rotate:{}", angle),
            Transform::Flip { direction } => write!(f, "flip:{}", direction.as_str()),
            Transform::Shear { factor } => write!(f, "shear:{}", factor),
            Transform::Brightness { factor } => write!(f, "brightness:{}", factor),
        }
    }
}

impl FromStr for Transform {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| AugmentError::InvalidTransform {
            spec: s.to_string(),
            message,
        };
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected KIND:VALUE, e.g. rotate:90".into()))?;
        let value = value.trim();
        let param = match value.parse::<f64>() {
            Ok(n) => TransformParam::Number(n),
            Err(_) => TransformParam::Word(value.to_string()),
        };
        Transform::from_parts(kind, param).map_err(invalid)
    }
}

/// Accepted parameter shapes: `90`, `horizontal`, or `{angle: 90}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransformParam {
    Number(f64),
    Word(String),
    Named(BTreeMap<String, TransformParam>),
}

impl TransformParam {
    fn unwrap_named(self, expected: &str) -> Result<TransformParam, String> {
        match self {
            TransformParam::Named(mut map) => {
                if map.len() != 1 {
                    return Err(format!("expected a single '{}' parameter", expected));
                }
                map.remove(expected)
                    .ok_or_else(|| format!("expected parameter '{}'", expected))?
                    .unwrap_named(expected)
            }
            other => Ok(other),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TransformRepr {
    Compact(String),
    Tagged(BTreeMap<String, TransformParam>),
}

/// Serialized as a single-key map, e.g. `{"rotate": 90}`.
impl Serialize for Transform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Transform::Rotate { angle } => map.serialize_entry("rotate", angle)?,
            Transform::Flip { direction } => map.serialize_entry("flip", direction.as_str())?,
            Transform::Shear { factor } => map.serialize_entry("shear", factor)?,
            Transform::Brightness { factor } => map.serialize_entry("brightness", factor)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match TransformRepr::deserialize(deserializer)? {
            TransformRepr::Compact(s) => s.parse().map_err(D::Error::custom),
            TransformRepr::Tagged(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((kind, param)), None) => {
                        Transform::from_parts(&kind, param).map_err(D::Error::custom)
                    }
                    _ => Err(D::Error::custom(
                        "a transform must be a single-key map like {rotate: 90}",
                    )),
                }
            }
        }
    }
}

/// The transform list applied when none is configured.
pub fn default_transforms() -> Vec<Transform> {
    vec![
        Transform::Rotate { angle: 90.0 },
        Transform::Flip {
            direction: FlipDirection::Horizontal,
        },
        Transform::Shear { factor: 0.2 },
        Transform::Brightness { factor: 0.8 },
    ]
}
