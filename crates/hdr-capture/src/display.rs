use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Opaque identity of a display, the platform's monitor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub isize);

/// A rectangle in virtual desktop coordinates. Coordinates may be negative for displays left of
/// or above the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayRect {
    /// Left edge, inclusive.
    pub left: i32,
    /// Top edge, inclusive.
    pub top: i32,
    /// Right edge, exclusive.
    pub right: i32,
    /// Bottom edge, exclusive.
    pub bottom: i32,
}

/// A rect with no area.
#[derive(Debug, Error)]
#[error("Rect ({left}, {top})-({right}, {bottom}) has no area")]
pub struct EmptyRect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl DisplayRect {
    /// Create a new rect, `right` must be greater than `left` and `bottom` greater than `top`.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, EmptyRect> {
        if right <= left || bottom <= top {
            return Err(EmptyRect {
                left,
                top,
                right,
                bottom,
            });
        }

        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Create a rect from its top left corner and a size.
    pub fn from_position_size(position: [i32; 2], size: [u32; 2]) -> Result<Self, EmptyRect> {
        let right = i64::from(position[0]) + i64::from(size[0]);
        let bottom = i64::from(position[1]) + i64::from(size[1]);

        Self::new(
            position[0],
            position[1],
            i32::try_from(right).unwrap_or(i32::MAX),
            i32::try_from(bottom).unwrap_or(i32::MAX),
        )
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.left.abs_diff(self.right)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.top.abs_diff(self.bottom)
    }

    /// `[width, height]` in pixels.
    pub fn size(&self) -> [u32; 2] {
        [self.width(), self.height()]
    }

    /// The smallest rect that contains both rects.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Returns whether `other` lies entirely inside this rect.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// Returns whether the two rects share any pixels.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

impl core::fmt::Display for DisplayRect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Luminance metadata of a display in HDR mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HdrMetadata {
    /// Luminance that SDR white is shown at, in nits.
    pub sdr_white_nits: f32,

    /// Peak luminance the display reports, in nits.
    pub max_luminance_nits: f32,
}

/// An attached display.
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    /// The display's identity.
    pub id: DisplayId,

    /// The platform device name, used to join data from different platform queries.
    pub name: String,

    /// The display's bounds in virtual desktop coordinates.
    pub rect: DisplayRect,

    /// Present only when the display is in HDR mode.
    pub hdr: Option<HdrMetadata>,
}

impl Display {
    /// Whether the display is currently in HDR mode.
    pub fn is_hdr(&self) -> bool {
        self.hdr.is_some()
    }
}

impl core::fmt::Display for Display {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Display {{name: \"{}\", rect: {}", self.name, self.rect)?;

        match self.hdr {
            Some(hdr) => write!(
                f,
                ", sdr_white: {}nits, max_luminance: {}nits}}",
                hdr.sdr_white_nits, hdr.max_luminance_nits
            ),
            None => write!(f, ", SDR}}"),
        }
    }
}

/// Geometry of a display from the platform's monitor enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// The display's identity.
    pub id: DisplayId,

    /// The platform device name.
    pub name: String,

    /// The display's bounds.
    pub rect: DisplayRect,
}

/// Advanced colour state of a display from the platform's display configuration, keyed by
/// device name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorState {
    /// Whether the display is in HDR mode.
    pub is_hdr: bool,

    /// The display's SDR white level in nits, only meaningful when `is_hdr`.
    pub sdr_white_nits: f32,
}

/// Joins the platform's display geometry with colour states by device name and maximum
/// luminances by display id.
///
/// A display with no colour state is treated as SDR. A HDR display with no reported maximum
/// luminance is given `0.0`, which is rejected before any tonemapping.
pub fn join_displays(
    geometry: Vec<DisplayGeometry>,
    color_states: &HashMap<String, ColorState>,
    max_luminances: &HashMap<DisplayId, f32>,
) -> Vec<Display> {
    geometry
        .into_iter()
        .map(|geometry| {
            let hdr = match color_states.get(&geometry.name) {
                Some(state) if state.is_hdr => {
                    let max_luminance_nits = match max_luminances.get(&geometry.id) {
                        Some(max_luminance) => *max_luminance,
                        None => {
                            debug!(
                                "No maximum luminance reported for \"{}\", using 0",
                                geometry.name
                            );
                            0.0
                        }
                    };

                    Some(HdrMetadata {
                        sdr_white_nits: state.sdr_white_nits,
                        max_luminance_nits,
                    })
                }

                Some(_) => None,

                None => {
                    debug!(
                        "No colour state for \"{}\", treating display as SDR",
                        geometry.name
                    );
                    None
                }
            };

            Display {
                id: geometry.id,
                name: geometry.name,
                rect: geometry.rect,
                hdr,
            }
        })
        .collect()
}

/// A source of the currently attached displays.
pub trait DisplaySource {
    /// The error returned when the displays cannot be enumerated.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Returns the currently attached displays. Either every display is returned or an error.
    fn displays(&self) -> Result<Vec<Display>, Self::Error>;
}
