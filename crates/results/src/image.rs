//! Rendered report visualisations

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File format for rendered visualisations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Scalable Vector Graphics
    #[default]
    Svg,
    /// Portable Network Graphics
    Png,
    /// JPEG
    Jpg,
}

impl ImageFormat {
    /// File extension without the dot, as the dispatcher names its outputs
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    /// IANA media type of the format
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_extension())
    }
}

/// A visualisation fetched from the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    format: ImageFormat,
    data: Vec<u8>,
}

impl RenderedImage {
    /// Wrap raw image bytes
    #[must_use]
    pub fn new(format: ImageFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }

    /// The format the image was rendered in
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// IANA media type of the image
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    /// The raw image bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image and return its bytes
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Write the image to a file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.data).map_err(|source| Error::io(source, path, "write"))
    }
}
