//! Pixel codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the five operations the engine needs from
//! an image library: identify, decode, crop, resize, and encode. Everything
//! above this layer works on whole images and byte buffers, never on pixels.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on the `image` crate.

use super::params::{OutputFormat, Quality};
use crate::geometry::PixelRect;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a recognized image: {0}")]
    Unrecognized(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for pixel codecs.
///
/// Implementations must be deterministic: the same input bytes and parameters
/// always encode to the same output bytes. Concurrent generation of one
/// variant relies on this to make a lost create race harmless.
pub trait ImageCodec: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, CodecError>;

    /// Decode an encoded image into a pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Cut a pixel rectangle out of an image.
    fn crop(&self, image: DynamicImage, rect: PixelRect) -> Result<DynamicImage, CodecError>;

    /// Scale to exactly `width x height`, ignoring aspect ratio.
    fn resize(
        &self,
        image: DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError>;

    /// Encode to bytes in the given format.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::RustCodec;
    use std::sync::Mutex;

    /// Codec that records every call and delegates to [`RustCodec`].
    /// Uses Mutex (not RefCell) so it is Sync and works across threads.
    #[derive(Default)]
    pub struct RecordingCodec {
        inner: RustCodec,
        pub operations: Mutex<Vec<RecordedOp>>,
        /// When set, `decode` fails with this message.
        pub fail_decode: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify,
        Decode,
        Crop(PixelRect),
        Resize { width: u32, height: u32 },
        Encode(OutputFormat),
    }

    impl RecordingCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_decode: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn decode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| **op == RecordedOp::Decode)
                .count()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageCodec for RecordingCodec {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
            self.record(RecordedOp::Identify);
            self.inner.identify(bytes)
        }

        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
            self.record(RecordedOp::Decode);
            if let Some(message) = &self.fail_decode {
                return Err(CodecError::ProcessingFailed(message.clone()));
            }
            self.inner.decode(bytes)
        }

        fn crop(&self, image: DynamicImage, rect: PixelRect) -> Result<DynamicImage, CodecError> {
            self.record(RecordedOp::Crop(rect));
            self.inner.crop(image, rect)
        }

        fn resize(
            &self,
            image: DynamicImage,
            width: u32,
            height: u32,
        ) -> Result<DynamicImage, CodecError> {
            self.record(RecordedOp::Resize { width, height });
            self.inner.resize(image, width, height)
        }

        fn encode(
            &self,
            image: &DynamicImage,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Encode(format));
            self.inner.encode(image, format, quality)
        }
    }

    #[test]
    fn recording_codec_records_decode() {
        let codec = RecordingCodec::new();
        let bytes = crate::test_helpers::jpeg_bytes(8, 6);
        let img = codec.decode(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
        assert_eq!(codec.get_operations(), vec![RecordedOp::Decode]);
        assert_eq!(codec.decode_count(), 1);
    }

    #[test]
    fn failing_codec_errors_on_decode() {
        let codec = RecordingCodec::failing("boom");
        let err = codec.decode(b"anything").unwrap_err();
        assert!(matches!(err, CodecError::ProcessingFailed(m) if m == "boom"));
        assert_eq!(codec.decode_count(), 1);
    }
}
