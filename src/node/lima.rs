use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tracing::info;

use super::error::*;
use super::tree::QuadTree;

/// File extension of compressed files.
pub const EXTENSION: &str = "lima";

/// Largest image, in pixels, that `parse_lima` will allocate.
pub const MAX_PIXELS: u64 = 1 << 28;

/// Separates the header and the leaf records.
pub const RECORD_SEPARATOR: char = '&';
/// Separates the fields of the header and of a record.
pub const FIELD_SEPARATOR: char = ';';
/// Separates the channels of a record's color.
pub const COLOR_SEPARATOR: char = ',';

impl QuadTree {
	/// Encodes the tree as LIMA text:
	/// `<height>;<width>&x1;y1;x2;y2;r,g,b&...`, one record per leaf in
	/// traversal order.
	pub fn to_lima(&self) -> Result<String, EncodeError> {
		let (width, height) = self.image().dimensions();
		let mut out = format!("{}{}{}", height, FIELD_SEPARATOR, width);
		for leaf in self.leaves() {
			out.push(RECORD_SEPARATOR);
			out.push_str(&leaf.to_record()?);
		}
		Ok(out)
	}

	/// Writes the LIMA encoding to `<save_path>/<filename>.lima`.
	///
	/// Both arguments are required; an absent or empty one is a
	/// configuration error. Returns the path written.
	pub fn write_compressed_file(
		&self,
		save_path: Option<&Path>,
		filename: Option<&str>
	) -> Result<PathBuf, PersistError> {
		let dir = save_path
			.filter(|p| !p.as_os_str().is_empty())
			.ok_or(ConfigError::MissingDestination)?;
		let name = filename
			.filter(|n| !n.is_empty())
			.ok_or(ConfigError::MissingFileName)?;
		let path = dir.join(format!("{}.{}", name, EXTENSION));
		let data = self.to_lima()?;
		fs::write(&path, data.as_bytes())?;
		info!(path = %path.display(), bytes = data.len(), "wrote compressed file");
		Ok(path)
	}
}

/// Splits an output path into the directory and file name that
/// `write_compressed_file` expects.
///
/// The path may leave off the extension, but any extension it has must be
/// `.lima`. A bare file name resolves to the current directory.
pub fn output_target(path: &Path) -> Result<(&Path, Option<&str>), FormatError> {
	if path.extension().map_or(false, |e| e != EXTENSION) {
		return Err(FormatError::WrongExtension(path.to_path_buf()));
	}
	let dir = path.parent()
		.filter(|p| !p.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));
	Ok((dir, path.file_stem().and_then(|s| s.to_str())))
}

fn parse_header(header: &str) -> Result<(u32, u32), FormatError> {
	let malformed = || FormatError::MalformedHeader(header.to_string());
	let mut fields = header.split(FIELD_SEPARATOR);
	let mut next = || fields.next()
		.and_then(|f| f.trim().parse::<u32>().ok())
		.ok_or_else(malformed);
	let (height, width) = (next()?, next()?);
	if fields.next().is_some() {
		return Err(malformed());
	}
	Ok((height, width))
}

/// One decoded leaf record: exclusive corners and a color.
struct Record {
	from: (u32, u32),
	to: (u32, u32),
	color: Rgb<u8>,
}

fn parse_record(index: usize, record: &str) -> Result<Record, FormatError> {
	let malformed = || FormatError::MalformedRecord { index, record: record.to_string() };
	let fields = record.split(FIELD_SEPARATOR).collect::<Vec<_>>();
	if fields.len() != 5 {
		return Err(malformed());
	}
	let mut coords = [0u32; 4];
	for (c, f) in coords.iter_mut().zip(fields.iter()) {
		*c = f.trim().parse().map_err(|_| malformed())?;
	}
	let channels = fields[4].split(COLOR_SEPARATOR)
		.map(|c| c.trim().parse::<u8>().map_err(|_| malformed()))
		.collect::<Result<Vec<_>, _>>()?;
	if channels.len() != 3 {
		return Err(malformed());
	}
	Ok(Record {
		from: (coords[0], coords[1]),
		to: (coords[2], coords[3]),
		color: Rgb([channels[0], channels[1], channels[2]]),
	})
}

/// Decodes LIMA text into the image it describes.
///
/// Pixels not covered by any record stay black. Any bad record fails the
/// whole decode.
pub fn parse_lima(text: &str) -> Result<RgbImage, FormatError> {
	let mut parts = text.trim_end().split(RECORD_SEPARATOR);
	let (height, width) = parse_header(parts.next().unwrap_or(""))?;
	let pixels = width as u64 * height as u64;
	let fits = pixels.checked_mul(3)
		.and_then(|bytes| usize::try_from(bytes).ok())
		.is_some();
	if pixels > MAX_PIXELS || !fits {
		return Err(FormatError::TooLarge { width, height, limit: MAX_PIXELS });
	}
	let mut img = RgbImage::new(width, height);
	for (index, record) in parts.enumerate() {
		let Record { from, to, color } = parse_record(index, record)?;
		if to.0 < from.0 || to.1 < from.1 || to.0 > width || to.1 > height {
			return Err(FormatError::OutOfBounds {
				index,
				record: record.to_string(),
				width,
				height,
			});
		}
		for y in from.1..to.1 {
			for x in from.0..to.0 {
				img.put_pixel(x, y, color);
			}
		}
	}
	Ok(img)
}

/// Reads a `.lima` file and decodes it into an image.
pub fn read_compressed_file<P: AsRef<Path>>(path: P) -> Result<RgbImage, ReadError> {
	let path = path.as_ref();
	if path.extension().map_or(true, |e| e != EXTENSION) {
		return Err(FormatError::WrongExtension(path.to_path_buf()).into());
	}
	let text = fs::read_to_string(path)?;
	let img = parse_lima(&text)?;
	info!(path = %path.display(), width = img.width(), height = img.height(), "read compressed file");
	Ok(img)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::BuildOptions;

	fn stripes() -> RgbImage {
		RgbImage::from_fn(2, 2, |_, y| if y == 0 { Rgb([0; 3]) } else { Rgb([255; 3]) })
	}

	#[test]
	fn test_two_by_two_encoding() {
		let tree = QuadTree::new(
			&stripes(),
			BuildOptions { threshold: Some(10.), min_quad_size: Some(1) },
		).unwrap();
		assert_eq!(
			tree.to_lima().unwrap(),
			"2;2&0;0;1;1;0,0,0&1;0;2;1;0,0,0&0;1;1;2;255,255,255&1;1;2;2;255,255,255"
		);
	}

	#[test]
	fn test_header_uses_height_first() {
		let img = RgbImage::from_pixel(7, 3, Rgb([1, 2, 3]));
		let tree = QuadTree::new(&img, BuildOptions { threshold: Some(5.), min_quad_size: Some(1) }).unwrap();
		assert_eq!(tree.to_lima().unwrap(), "3;7&0;0;7;3;1,2,3");
	}

	#[test]
	fn test_parse_matches_render() {
		let img = RgbImage::from_fn(13, 9, |x, y| Rgb([(x * 19) as u8, (y * 27) as u8, (x * y) as u8]));
		let tree = QuadTree::new(&img, BuildOptions { threshold: Some(20.), min_quad_size: Some(2) }).unwrap();
		assert_eq!(parse_lima(&tree.to_lima().unwrap()).unwrap(), tree.render());
	}

	#[test]
	fn test_parse_header_only() {
		let img = parse_lima("3;4\n").unwrap();
		assert_eq!(img.dimensions(), (4, 3));
		assert!(img.pixels().all(|p| *p == Rgb([0; 3])));
	}

	#[test]
	fn test_parse_rejects_bad_header() {
		for text in ["", "3", "3;x", "3;4;5", "-1;2"].iter() {
			assert!(matches!(parse_lima(text), Err(FormatError::MalformedHeader(_))), "{:?}", text);
		}
	}

	#[test]
	fn test_parse_rejects_huge_shape() {
		for text in ["4294967295;4294967295", "60000;60000", "1;268435457"].iter() {
			assert!(matches!(parse_lima(text), Err(FormatError::TooLarge { .. })), "{:?}", text);
		}
		assert_eq!(parse_lima("1;4096&0;0;1;1;1,2,3").unwrap().get_pixel(0, 0), &Rgb([1, 2, 3]));
	}

	#[test]
	fn test_parse_rejects_bad_records() {
		let bad = [
			"2;2&0;0;1;1",
			"2;2&0;0;1;1;0,0",
			"2;2&0;0;1;1;0,0,0,0",
			"2;2&0;0;1;1;256,0,0",
			"2;2&0;0;a;1;0,0,0",
			"2;2&0;0;1;1;0,0,0&",
		];
		for text in bad.iter() {
			assert!(matches!(parse_lima(text), Err(FormatError::MalformedRecord { .. })), "{:?}", text);
		}
	}

	#[test]
	fn test_parse_rejects_out_of_bounds() {
		assert_eq!(
			parse_lima("2;2&0;0;1;1;0,0,0&1;1;3;2;5,5,5").unwrap_err(),
			FormatError::OutOfBounds { index: 1, record: "1;1;3;2;5,5,5".to_string(), width: 2, height: 2 }
		);
		assert!(matches!(parse_lima("2;2&1;1;0;2;5,5,5"), Err(FormatError::OutOfBounds { .. })));
	}

	#[test]
	fn test_read_rejects_extension() {
		let err = read_compressed_file("picture.png").unwrap_err();
		assert!(matches!(err, ReadError::Format(FormatError::WrongExtension(_))));
		let err = read_compressed_file("no_extension").unwrap_err();
		assert!(matches!(err, ReadError::Format(FormatError::WrongExtension(_))));
	}

	#[test]
	fn test_output_target() {
		assert_eq!(
			output_target(Path::new("out/pic.lima")).unwrap(),
			(Path::new("out"), Some("pic"))
		);
		assert_eq!(output_target(Path::new("pic")).unwrap(), (Path::new("."), Some("pic")));
		assert_eq!(
			output_target(Path::new("out/pic.png")).unwrap_err(),
			FormatError::WrongExtension(PathBuf::from("out/pic.png"))
		);
	}

	#[test]
	fn test_write_requires_destination_and_name() {
		let tree = QuadTree::new(&stripes(), BuildOptions::default()).unwrap();
		let dir = Path::new(".");
		assert!(matches!(
			tree.write_compressed_file(None, Some("x")),
			Err(PersistError::Config(ConfigError::MissingDestination))
		));
		assert!(matches!(
			tree.write_compressed_file(Some(dir), None),
			Err(PersistError::Config(ConfigError::MissingFileName))
		));
		assert!(matches!(
			tree.write_compressed_file(Some(dir), Some("")),
			Err(PersistError::Config(ConfigError::MissingFileName))
		));
	}
}
