use thiserror::Error;

/// Pixel layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per channel, BGRA byte order, sRGB encoded.
    Bgra8Unorm,

    /// 16 bit float per channel, RGBA order, linear scRGB where `1.0` is 80 nits.
    Rgba16Float,
}

impl PixelFormat {
    /// Size of one pixel in bytes.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8Unorm => 4,
            Self::Rgba16Float => 8,
        }
    }
}

/// A single captured frame, tightly packed with no row padding.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    format: PixelFormat,
    width: u32,
    height: u32,
    data: Box<[u8]>,
}

/// Reasons a frame cannot be constructed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// Width or height is zero.
    #[error("Frame has no pixels ({width}x{height})")]
    Empty {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The data does not match the format and size.
    #[error("Frame data is {actual} bytes, expected {expected} bytes")]
    Length {
        /// Bytes required.
        expected: usize,
        /// Bytes given.
        actual: usize,
    },
}

impl CapturedFrame {
    /// Create a frame from tightly packed pixel data.
    pub fn new<D: Into<Box<[u8]>>>(
        format: PixelFormat,
        width: u32,
        height: u32,
        data: D,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }

        let data = data.into();
        let expected = Self::byte_length(format, width, height);
        if data.len() != expected {
            return Err(FrameError::Length {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            format,
            width,
            height,
            data,
        })
    }

    /// Create a frame where every pixel is `pixel`.
    pub fn filled(
        format: PixelFormat,
        width: u32,
        height: u32,
        pixel: &[u8],
    ) -> Result<Self, FrameError> {
        if pixel.len() != format.bytes_per_pixel() {
            return Err(FrameError::Length {
                expected: format.bytes_per_pixel(),
                actual: pixel.len(),
            });
        }

        let data = pixel.repeat(width as usize * height as usize);
        Self::new(format, width, height, data)
    }

    /// Number of bytes a frame of this format and size occupies.
    pub fn byte_length(format: PixelFormat, width: u32, height: u32) -> usize {
        width as usize * height as usize * format.bytes_per_pixel()
    }

    /// Pixel layout of the data.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `[width, height]` in pixels.
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Bytes in one row.
    pub fn row_pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// The tightly packed pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl core::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}
