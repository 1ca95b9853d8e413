use core::time::Duration;
use std::{
    sync::mpsc::{Sender, channel},
    thread,
};

use thiserror::Error;
use tracing::{debug, error, info, info_span, instrument};
use utilities::DebugTime;

use crate::{
    BoxError, CaptureProvider, CapturedFrame, DeviceLock, Display, DisplayId, DisplaySource,
    InvalidToneMapParams, PixelFormat, PlaceError, RunConfig, ToneMapParams, Tonemapper,
    compose::{Canvas, ComposeError, Composer, DisplayResult, union_rect},
};

/// The finished canvas of a run and what happened to each display.
#[derive(Debug)]
pub struct Screenshot {
    /// The composed canvas.
    pub canvas: Canvas,

    /// Summary of the run.
    pub report: RunReport,
}

/// Summary of a screenshot run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Every display in the run.
    pub displays: Vec<DisplayId>,

    /// Names of displays that went through the HDR pipeline.
    pub tonemapped: Vec<String>,

    /// Names of displays left as background after failing.
    pub filled: Vec<String>,

    /// Wall time of the run.
    pub duration: Duration,
}

/// Why a single display could not be captured.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DisplayError {
    /// The display's HDR metadata cannot drive the tonemapper.
    #[error("Display has invalid HDR metadata:\n{0}")]
    InvalidMetadata(#[from] InvalidToneMapParams),

    /// The capture thread could not be spawned.
    #[error("Failed to start the capture thread:\n{0}")]
    Spawn(#[source] std::io::Error),

    /// The capture provider failed.
    #[error("Failed to capture display:\n{0}")]
    Capture(#[source] BoxError),

    /// The provider returned a frame that does not match the request.
    #[error("Captured frame is {actual:?} {actual_format:?}, expected {expected:?} {expected_format:?}")]
    UnexpectedFrame {
        /// Size of the display.
        expected: [u32; 2],
        /// Format that was requested.
        expected_format: PixelFormat,
        /// Size of the frame.
        actual: [u32; 2],
        /// Format of the frame.
        actual_format: PixelFormat,
    },

    /// The tonemapper failed.
    #[error("Failed to tonemap capture:\n{0}")]
    Tonemap(#[source] BoxError),

    /// The frame could not be copied onto the canvas.
    #[error("Failed to place capture on the canvas:\n{0}")]
    Place(#[source] PlaceError),

    /// The capture thread ended without reporting.
    #[error("Capture thread exited without a result")]
    Disconnected,
}

/// Why a run produced no screenshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The display source failed.
    #[error("Failed to enumerate displays:\n{0}")]
    Enumerate(#[source] BoxError),

    /// The display source found nothing to capture.
    #[error("No displays are attached")]
    NoDisplays,

    /// A display failed and the failure policy aborts the run.
    #[error("Failed to compose screenshot:\n{0}")]
    Compose(#[from] ComposeError),
}

/// How a single display is handled in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DisplayPlan {
    format: PixelFormat,
    params: Option<ToneMapParams>,
}

/// Drives a single screenshot run: enumerate, capture and tonemap every display concurrently,
/// then compose.
#[derive(Debug)]
pub struct Screenshotter {
    config: RunConfig,
    device_lock: DeviceLock,
}

impl Screenshotter {
    /// Create the orchestrator. `device_lock` must be the same lock the capture provider uses.
    pub fn new(config: RunConfig, device_lock: DeviceLock) -> Self {
        Self {
            config,
            device_lock,
        }
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> RunConfig {
        self.config
    }

    /// Take a screenshot of every attached display.
    #[instrument("Screenshotter::take", skip_all, err)]
    pub fn take<S, P, T>(
        &self,
        source: &S,
        provider: &P,
        tonemapper: &T,
    ) -> Result<Screenshot, RunError>
    where
        S: DisplaySource,
        P: CaptureProvider,
        T: Tonemapper,
    {
        let timer = DebugTime::start("Screenshot");

        let displays = source
            .displays()
            .map_err(|e| RunError::Enumerate(Box::new(e)))?;

        for target in &displays {
            debug!("{target}");
        }

        // The canvas is sized from geometry alone, before any capture completes.
        let bounds = union_rect(&displays).ok_or(RunError::NoDisplays)?;
        let mut canvas = Canvas::new(bounds);
        info!(
            "Capturing {} displays onto a {}x{} canvas",
            displays.len(),
            canvas.width(),
            canvas.height()
        );

        let plans: Vec<DisplayPlan> = displays.iter().map(|d| self.plan(d)).collect();
        let composer = Composer::new(&displays, self.config.failure_policy, self.device_lock.clone());

        let (sender, receiver) = channel::<DisplayResult>();
        let filled = thread::scope(|scope| {
            for (index, (target, plan)) in displays.iter().zip(plans.iter().copied()).enumerate() {
                let task_sender = sender.clone();

                let spawned = thread::Builder::new()
                    .name(format!("Capture {index}"))
                    .spawn_scoped(scope, move || {
                        let _span = info_span!("[Capture Thread]", display = %target.name).entered();
                        let result = self.screenshot_display(target, plan, provider, tonemapper);
                        send_result(&task_sender, index, result);
                    });

                if let Err(e) = spawned {
                    send_result(&sender, index, Err(DisplayError::Spawn(e)));
                }
            }

            // The composer finishes once every task's sender is dropped.
            drop(sender);
            composer.compose(&mut canvas, receiver)
        })?;

        let report = RunReport {
            displays: displays.iter().map(|target| target.id).collect(),
            tonemapped: displays
                .iter()
                .zip(&plans)
                .filter(|(_, plan)| plan.params.is_some())
                .map(|(target, _)| target.name.clone())
                .collect(),
            filled,
            duration: timer.finish(),
        };

        Ok(Screenshot { canvas, report })
    }

    fn plan(&self, target: &Display) -> DisplayPlan {
        let params = self.config.hdr_mode.tonemap_params(target);
        let format = match params {
            Some(_) => PixelFormat::Rgba16Float,
            None => PixelFormat::Bgra8Unorm,
        };

        DisplayPlan { format, params }
    }

    /// Capture a single display and, if planned, tonemap it.
    fn screenshot_display<P: CaptureProvider, T: Tonemapper>(
        &self,
        target: &Display,
        plan: DisplayPlan,
        provider: &P,
        tonemapper: &T,
    ) -> Result<CapturedFrame, DisplayError> {
        if let Some(params) = plan.params {
            params.validate()?;
        }

        let frame = {
            let _timer = DebugTime::start(format!("Capture {}", target.name));
            provider
                .capture(target, plan.format)
                .map_err(|e| DisplayError::Capture(Box::new(e)))?
        };

        if frame.size() != target.rect.size() || frame.format() != plan.format {
            return Err(DisplayError::UnexpectedFrame {
                expected: target.rect.size(),
                expected_format: plan.format,
                actual: frame.size(),
                actual_format: frame.format(),
            });
        }

        let Some(params) = plan.params else {
            return Ok(frame);
        };

        let sdr_frame = {
            let _timer = DebugTime::start(format!("Tonemap {}", target.name));
            let _guard = self.device_lock.lock();
            tonemapper
                .process(&frame, params)
                .map_err(|e| DisplayError::Tonemap(Box::new(e)))?
        };
        drop(frame);

        Ok(sdr_frame)
    }
}

fn send_result(
    sender: &Sender<DisplayResult>,
    index: usize,
    result: Result<CapturedFrame, DisplayError>,
) {
    if let Err(e) = sender.send((index, result)) {
        // The composer only stops receiving after aborting the run.
        if let (_, Err(source)) = e.0 {
            error!("Display {index} failed after the run was aborted:\n{source}");
        }
    }
}
