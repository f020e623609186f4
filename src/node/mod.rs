pub mod error;

use image::{GenericImageView, Rgb, RgbImage, SubImage};

/// One rectangular region of an image, plus how it was subdivided.
///
/// A quadrant is either a leaf (no sections) or is split into exactly four
/// sections which tile it in the order top-left, top-right, bottom-left,
/// bottom-right.
///
/// Its mean color is written at most once; after that it is never
/// re-evaluated, even when asked again with different pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadrant {
	pub origin: (u32, u32),
	pub width: u32,
	pub height: u32,
	pub depth: u32,
	sections: Option<Box<[Quadrant; 4]>>,
	color: Option<Rgb<u8>>,
}

/// Per-channel mean of a block of pixels, truncated toward zero.
///
/// An empty block has a black mean.
pub fn mean_of<V: GenericImageView<Pixel = Rgb<u8>>>(pixels: &V) -> Rgb<u8> {
	let count = pixels.width() as u64 * pixels.height() as u64;
	if count == 0 {
		return Rgb([0; 3]);
	}
	let sums = pixels.pixels().fold([0u64; 3], |mut s, (_, _, p)| {
		for (acc, c) in s.iter_mut().zip(p.0.iter()) {
			*acc += *c as u64;
		}
		s
	});
	Rgb([
		(sums[0] / count) as u8,
		(sums[1] / count) as u8,
		(sums[2] / count) as u8,
	])
}

/// Root-mean-square deviation of every channel of every pixel from `mean`,
/// taken over all channels and pixels at once.
pub fn rms_deviation<V: GenericImageView<Pixel = Rgb<u8>>>(pixels: &V, mean: Rgb<u8>) -> f64 {
	let samples = pixels.width() as u64 * pixels.height() as u64 * 3;
	if samples == 0 {
		return 0.;
	}
	let squares = pixels.pixels().fold(0., |acc, (_, _, p)| {
		acc + p.0.iter()
			.zip(mean.0.iter())
			.map(|(c, m)| (*c as f64 - *m as f64).powi(2))
			.sum::<f64>()
	});
	(squares / samples as f64).sqrt()
}

impl Quadrant {
	pub fn new(x: u32, y: u32, width: u32, height: u32, depth: u32) -> Self {
		Quadrant {
			origin: (x, y),
			width,
			height,
			depth,
			sections: None,
			color: None,
		}
	}

	pub fn area(&self) -> u64 {
		self.width as u64 * self.height as u64
	}

	pub fn is_leaf(&self) -> bool {
		self.sections.is_none()
	}

	/// The four sections, if this quadrant was split.
	pub fn sections(&self) -> Option<&[Quadrant; 4]> {
		self.sections.as_deref()
	}

	/// The cached mean color, if it has been computed.
	pub fn color(&self) -> Option<Rgb<u8>> {
		self.color
	}

	/// Attaches all four sections at once. Only the tree builder splits
	/// quadrants, and only once per quadrant.
	pub(crate) fn attach(&mut self, sections: [Quadrant; 4]) {
		debug_assert!(self.sections.is_none(), "quadrant split twice");
		self.sections = Some(Box::new(sections));
	}

	/// View of the pixels this quadrant covers. Deref it (`&*q.extract(..)`)
	/// to get a `GenericImageView`.
	///
	/// The caller must make sure the quadrant lies inside `raster`, which
	/// always holds for quadrants produced by halving that raster's own
	/// dimensions.
	pub fn extract<'a>(&self, raster: &'a RgbImage) -> SubImage<&'a RgbImage> {
		raster.view(self.origin.0, self.origin.1, self.width, self.height)
	}

	/// Mean color of `pixels`, computed on the first call and cached.
	///
	/// Later calls return the cached color no matter what is passed in.
	pub fn mean_color<V: GenericImageView<Pixel = Rgb<u8>>>(&mut self, pixels: &V) -> Rgb<u8> {
		*self.color.get_or_insert_with(|| mean_of(pixels))
	}

	/// Cached mean color, or a fresh one from `raster` if none is cached yet.
	pub(crate) fn color_in(&self, raster: &RgbImage) -> Rgb<u8> {
		self.color.unwrap_or_else(|| mean_of(&*self.extract(raster)))
	}

	/// Homogeneity score of this quadrant's region of `raster`: the RMS
	/// deviation of its pixels from its (truncated) mean color.
	///
	/// Zero means the region is a single flat color.
	pub fn error(&mut self, raster: &RgbImage) -> f64 {
		let region = self.extract(raster);
		let mean = self.mean_color(&*region);
		rms_deviation(&*region, mean)
	}

	/// Textual leaf record `x1;y1;x2;y2;r,g,b`, where `(x2, y2)` is the
	/// exclusive bottom-right corner.
	pub fn to_record(&self) -> Result<String, error::StateError> {
		let Rgb([r, g, b]) = self.color.ok_or(error::StateError::ColorNotComputed {
			x: self.origin.0,
			y: self.origin.1,
		})?;
		Ok(format!(
			"{};{};{};{};{},{},{}",
			self.origin.0,
			self.origin.1,
			self.origin.0 + self.width,
			self.origin.1 + self.height,
			r, g, b
		))
	}
}

pub mod lima;
pub mod render;
pub mod tree;
