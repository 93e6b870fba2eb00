//! Output capabilities. Implementations must never block the emulation
//! thread: buffer or drop instead.

/// Receives each completed video frame.
pub trait PixelSink {
    /// `rgb` holds `width * height * 3` bytes, row-major RGB24.
    fn present_frame(&mut self, width: u32, height: u32, rgb: &[u8]);
}

/// Receives mixed TIA audio in signed 16-bit mono.
pub trait AudioSink {
    fn push_samples(&mut self, sample_rate: u32, samples: &[i16]);
}

/// Discards everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PixelSink for NullSink {
    fn present_frame(&mut self, _width: u32, _height: u32, _rgb: &[u8]) {}
}

impl AudioSink for NullSink {
    fn push_samples(&mut self, _sample_rate: u32, _samples: &[i16]) {}
}
