use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use hdr_capture::{Canvas, PersistenceSink};
use image::{ImageBuffer, Rgba};
use png::{BitDepth, ColorType, Encoder, EncodingError, PixelDimensions, Unit};
use thiserror::Error;
use tracing::{info, instrument};
use utilities::DebugTime;

/// 96 DPI in pixels per metre.
pub const PIXELS_PER_METRE: u32 = 3780;

/// Writes canvases as 8 bit RGBA PNG files.
#[derive(Debug, Clone)]
pub struct PngSink {
    path: PathBuf,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to create image buffer:\nCanvas Size: {0}, {1}\nCanvas Data: {2}")]
    ImageBuffer(u32, u32, usize),

    #[error("Failed to create file for screenshot:\n{0}")]
    CreateFile(#[source] io::Error),

    #[error("Failed to encode screenshot:\n{0}")]
    Encode(#[from] EncodingError),

    #[error("Failed to write screenshot to file:\n{0}")]
    WriteFile(#[source] io::Error),
}

impl PngSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode a canvas as PNG into `writer`.
    pub fn encode<W: Write>(canvas: &Canvas, writer: W) -> Result<(), Error> {
        let image = to_rgba(canvas)?;

        let mut encoder = Encoder::new(writer, image.width(), image.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_pixel_dims(Some(PixelDimensions {
            xppu: PIXELS_PER_METRE,
            yppu: PIXELS_PER_METRE,
            unit: Unit::Meter,
        }));

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;

        Ok(())
    }
}

impl PersistenceSink for PngSink {
    type Error = Error;

    #[instrument("PngSink::persist", skip_all, err)]
    fn persist(&self, canvas: &Canvas) -> Result<(), Error> {
        let _timer = DebugTime::start("Save PNG");

        let file = File::create(&self.path).map_err(Error::CreateFile)?;
        let mut buffer = BufWriter::new(file);
        Self::encode(canvas, &mut buffer)?;
        buffer.flush().map_err(Error::WriteFile)?;

        info!("Saved screenshot to {}", self.path.display());
        Ok(())
    }
}

/// Swizzle the BGRA canvas to RGBA. The canvas is opaque so straight and premultiplied alpha
/// are the same.
pub fn to_rgba(canvas: &Canvas) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>, Error> {
    let mut data = canvas.data().to_vec();
    for pixel in data.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }

    let length = data.len();
    ImageBuffer::from_raw(canvas.width(), canvas.height(), data).ok_or(Error::ImageBuffer(
        canvas.width(),
        canvas.height(),
        length,
    ))
}
