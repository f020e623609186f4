use std::path::PathBuf;

use thiserror::Error;

/// Reason why a quadtree couldn't be built or persisted with the given settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
	/// The source image has a zero width or height.
	#[error("image must have a positive width and height (got {width}x{height})")]
	EmptyImage { width: u32, height: u32 },
	/// The error threshold is negative or not a number.
	#[error("threshold must be a non-negative number (got {0})")]
	InvalidThreshold(f64),
	/// No destination directory was supplied to persist into.
	#[error("a destination directory is required")]
	MissingDestination,
	/// No file name was supplied to persist into.
	#[error("a file name is required")]
	MissingFileName,
}

/// A quadrant was asked for something that needs its mean color first.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
	#[error("mean color of quadrant at ({x}, {y}) has not been computed")]
	ColorNotComputed { x: u32, y: u32 },
}

/// Reason why LIMA data couldn't be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
	/// The file does not carry the `.lima` extension.
	#[error("expected a .lima file, got {0:?}")]
	WrongExtension(PathBuf),
	/// There was no `<height>;<width>` header.
	#[error("missing or malformed shape header {0:?}")]
	MalformedHeader(String),
	/// The header declares an image too large to allocate.
	#[error("declared shape {width}x{height} exceeds the {limit}-pixel limit")]
	TooLarge { width: u32, height: u32, limit: u64 },
	/// A leaf record could not be parsed.
	#[error("malformed record #{index}: {record:?}")]
	MalformedRecord { index: usize, record: String },
	/// A leaf record is inverted or reaches outside the declared shape.
	#[error("record #{index} ({record:?}) does not fit a {width}x{height} image")]
	OutOfBounds { index: usize, record: String, width: u32, height: u32 },
}

/// Reason why a quadtree couldn't be encoded.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
	#[error(transparent)]
	State(#[from] StateError),
}

/// Reason why a quadtree couldn't be written to disk.
#[derive(Debug, Error)]
pub enum PersistError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Encode(#[from] EncodeError),
	#[error("could not write compressed file: {0}")]
	Io(#[from] std::io::Error),
}

/// Reason why a LIMA file couldn't be read back into an image.
#[derive(Debug, Error)]
pub enum ReadError {
	#[error(transparent)]
	Format(#[from] FormatError),
	#[error("could not read compressed file: {0}")]
	Io(#[from] std::io::Error),
}
