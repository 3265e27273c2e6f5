use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a conversion. All of it happens at the I/O
/// boundary; the projection math and the render loop cannot fail.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    Usage(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Error loading input image '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Input image '{}' is {width}x{height}, expected {expected}", .path.display())]
    Layout {
        path: PathBuf,
        width: usize,
        height: usize,
        expected: String,
    },
    #[error("Error allocating image memory for {width}x{height}x{channels}")]
    Allocation {
        width: usize,
        height: usize,
        channels: usize,
    },
    #[error("Error saving output image '{}': {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Usage(_) => 1,
            ConvertError::Decode { .. } | ConvertError::Layout { .. } => 2,
            ConvertError::Config(_) => 3,
            ConvertError::Allocation { .. } => 4,
            ConvertError::Encode { .. } | ConvertError::Io { .. } => 5,
        }
    }
}
