use std::sync::mpsc::Receiver;

use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::{
    CapturedFrame, DeviceLock, Display, DisplayError, DisplayRect, FailurePolicy, PixelFormat,
};

/// Opaque black in `Bgra8Unorm`.
const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// The smallest rect containing every display, `None` when there are no displays.
pub fn union_rect(displays: &[Display]) -> Option<DisplayRect> {
    displays
        .iter()
        .map(|display| display.rect)
        .reduce(|union, rect| union.union(&rect))
}

/// The virtual canvas every display's capture is placed on, in `Bgra8Unorm`.
pub struct Canvas {
    bounds: DisplayRect,
    data: Box<[u8]>,
}

/// Reasons a frame cannot be placed on the canvas.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaceError {
    /// The frame is not `Bgra8Unorm`.
    #[error("Only Bgra8Unorm frames can be placed, got {0:?}")]
    Format(PixelFormat),

    /// The frame and the region differ in size.
    #[error("Frame is {actual:?} but the region is {expected:?}")]
    Size {
        /// Size of the region.
        expected: [u32; 2],
        /// Size of the frame.
        actual: [u32; 2],
    },

    /// The region is not fully inside the canvas.
    #[error("Region {region} is outside of the canvas {bounds}")]
    OutOfBounds {
        /// The requested region.
        region: DisplayRect,
        /// The canvas bounds.
        bounds: DisplayRect,
    },
}

impl Canvas {
    /// Allocate a canvas covering `bounds`, cleared to opaque black.
    pub fn new(bounds: DisplayRect) -> Self {
        let pixels = bounds.width() as usize * bounds.height() as usize;
        let data = BACKGROUND.repeat(pixels).into_boxed_slice();

        Self { bounds, data }
    }

    /// The canvas bounds in virtual desktop coordinates.
    pub fn bounds(&self) -> DisplayRect {
        self.bounds
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    /// The canvas pixels, tightly packed `Bgra8Unorm`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The BGRA pixel at canvas coordinates `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }

        let index = (y as usize * self.width() as usize + x as usize) * 4;
        let mut pixel = [0; 4];
        pixel.copy_from_slice(&self.data[index..index + 4]);
        Some(pixel)
    }

    /// Offset of a region's top left corner from the canvas origin.
    pub fn offset_of(&self, region: &DisplayRect) -> Result<[u32; 2], PlaceError> {
        if !self.bounds.contains_rect(region) {
            return Err(PlaceError::OutOfBounds {
                region: *region,
                bounds: self.bounds,
            });
        }

        Ok([
            self.bounds.left.abs_diff(region.left),
            self.bounds.top.abs_diff(region.top),
        ])
    }

    /// Copy the whole frame into `region`. Placing non-overlapping regions is order independent.
    pub fn place(&mut self, region: &DisplayRect, frame: &CapturedFrame) -> Result<(), PlaceError> {
        if frame.format() != PixelFormat::Bgra8Unorm {
            return Err(PlaceError::Format(frame.format()));
        }

        if frame.size() != region.size() {
            return Err(PlaceError::Size {
                expected: region.size(),
                actual: frame.size(),
            });
        }

        let [x, y] = self.offset_of(region)?;
        let canvas_pitch = self.width() as usize * 4;
        let frame_pitch = frame.row_pitch();

        for (row, source) in frame.data().chunks_exact(frame_pitch).enumerate() {
            let start = (y as usize + row) * canvas_pitch + x as usize * 4;
            self.data[start..start + frame_pitch].copy_from_slice(source);
        }

        Ok(())
    }

    /// Reset a region to the background colour.
    pub fn clear(&mut self, region: &DisplayRect) -> Result<(), PlaceError> {
        let [x, y] = self.offset_of(region)?;
        let canvas_pitch = self.width() as usize * 4;
        let region_pitch = region.width() as usize * 4;

        for row in 0..region.height() as usize {
            let start = (y as usize + row) * canvas_pitch + x as usize * 4;
            for pixel in self.data[start..start + region_pitch].chunks_exact_mut(4) {
                pixel.copy_from_slice(&BACKGROUND);
            }
        }

        Ok(())
    }
}

impl core::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Canvas")
            .field("bounds", &self.bounds)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

/// A display's result, tagged with the display's index.
pub type DisplayResult = (usize, Result<CapturedFrame, DisplayError>);

/// A display that could not be placed.
#[derive(Debug, Error)]
#[error("Failed to screenshot {display}:\n{source}")]
pub struct ComposeError {
    /// Name of the failed display.
    pub display: String,

    /// Why it failed.
    #[source]
    pub source: DisplayError,
}

/// Places display results on a canvas as they complete.
pub struct Composer<'a> {
    displays: &'a [Display],
    failure_policy: FailurePolicy,
    device_lock: DeviceLock,
}

impl<'a> Composer<'a> {
    /// Create a composer for `displays`, results are identified by their index in this slice.
    pub fn new(displays: &'a [Display], failure_policy: FailurePolicy, device_lock: DeviceLock) -> Self {
        Self {
            displays,
            failure_policy,
            device_lock,
        }
    }

    /// Receive every display's result in completion order and place it on the canvas.
    ///
    /// Only returns once every display is accounted for. A display whose sender is dropped
    /// without a result is a failure. Returns the names of displays left as background.
    pub fn compose(
        &self,
        canvas: &mut Canvas,
        results: Receiver<DisplayResult>,
    ) -> Result<Vec<String>, ComposeError> {
        let _span = info_span!("compose").entered();

        let mut completed = vec![false; self.displays.len()];
        let mut filled = Vec::new();

        for (index, result) in results.iter() {
            let Some(target) = self.displays.get(index) else {
                warn!("Received a result for unknown display index {index}");
                continue;
            };
            completed[index] = true;

            let placed = result.and_then(|frame| {
                let _guard = self.device_lock.lock();
                canvas
                    .place(&target.rect, &frame)
                    .map_err(DisplayError::Place)
            });

            match placed {
                Ok(()) => debug!("Placed {}", target.name),
                Err(source) => self.handle_failure(canvas, target, source, &mut filled)?,
            }
        }

        for (target, _) in self
            .displays
            .iter()
            .zip(completed)
            .filter(|(_, completed)| !completed)
        {
            self.handle_failure(canvas, target, DisplayError::Disconnected, &mut filled)?;
        }

        Ok(filled)
    }

    fn handle_failure(
        &self,
        canvas: &mut Canvas,
        target: &Display,
        source: DisplayError,
        filled: &mut Vec<String>,
    ) -> Result<(), ComposeError> {
        match self.failure_policy {
            FailurePolicy::Abort => Err(ComposeError {
                display: target.name.clone(),
                source,
            }),

            FailurePolicy::FillBackground => {
                warn!(
                    "Leaving {} as background, screenshot failed:\n{source}",
                    target.name
                );

                let _guard = self.device_lock.lock();
                if let Err(e) = canvas.clear(&target.rect) {
                    warn!("Failed to clear region of {}:\n{e}", target.name);
                }

                filled.push(target.name.clone());
                Ok(())
            }
        }
    }
}
