//! Image codec plugin interface.
//!
//! The engine itself parses no compressed formats; hosts implement
//! `ImageCodec` for whatever formats they need and register them
//! explicitly. Lookup is by magic-byte signature.

use crate::error::{Error, Result};

/// Decoded image geometry, format-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    /// Row pitch of the decoded pixel data, in bytes.
    pub pitch: usize,
    /// Bits per pixel of the decoded data.
    pub bpp: u32,
    pub alpha: bool,
    /// Frame count; 1 for still images.
    pub frames: u32,
}

/// One image format implementation.
pub trait ImageCodec {
    /// Short format name ("png", "tga", ...).
    fn name(&self) -> &str;

    /// Magic-byte prefix identifying the format. Must be non-empty.
    fn signature(&self) -> &[u8];

    /// Parse geometry without decoding pixel data.
    fn read_header(&self, data: &[u8]) -> Result<ImageHeader>;

    /// Decode the whole image into raw pixel rows.
    fn decode(&self, data: &[u8]) -> Result<(ImageHeader, Vec<u8>)>;

    /// Emit the encoded header bytes through `sink`.
    fn write_header(&self, header: &ImageHeader, sink: &mut dyn FnMut(&[u8])) -> Result<()>;

    /// Encode raw pixel rows, emitting output through `sink`.
    fn encode(
        &self,
        header: &ImageHeader,
        pixels: &[u8],
        sink: &mut dyn FnMut(&[u8]),
    ) -> Result<()>;
}

/// Host-owned codec collection. Registration is an explicit call; no
/// dynamic loading.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: Vec<Box<dyn ImageCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, codec: Box<dyn ImageCodec>) {
        self.codecs.push(codec);
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Find the codec whose signature prefixes `data`.
    pub fn find_by_signature(&self, data: &[u8]) -> Result<&dyn ImageCodec> {
        self.codecs
            .iter()
            .find(|c| {
                let sig = c.signature();
                !sig.is_empty() && data.len() >= sig.len() && &data[..sig.len()] == sig
            })
            .map(|c| c.as_ref())
            .ok_or(Error::UnsupportedFormat)
    }

    pub fn find_by_name(&self, name: &str) -> Result<&dyn ImageCodec> {
        self.codecs
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or(Error::UnsupportedFormat)
    }
}
