use image::RgbImage;
use tracing::debug;

use super::error::ConfigError;
use super::Quadrant;

/// Settings controlling when the builder stops splitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
	/// Largest error a quadrant may have and still be kept whole.
	/// `None` disables the error check entirely.
	pub threshold: Option<f64>,
	/// Sections may not be narrower or shorter than this.
	/// `None` disables the size floor.
	pub min_quad_size: Option<u32>,
}

impl Default for BuildOptions {
	fn default() -> Self {
		BuildOptions { threshold: None, min_quad_size: Some(1) }
	}
}

/// A fully built quadtree over a private copy of its source image.
///
/// Building happens once, in `new`; afterwards the tree is read-only.
#[derive(Clone, Debug)]
pub struct QuadTree {
	image: RgbImage,
	options: BuildOptions,
	root: Quadrant,
}

impl QuadTree {
	/// Copies `image` and recursively splits it into quadrants.
	pub fn new(image: &RgbImage, options: BuildOptions) -> Result<Self, ConfigError> {
		let (width, height) = image.dimensions();
		if width == 0 || height == 0 {
			return Err(ConfigError::EmptyImage { width, height });
		}
		if let Some(t) = options.threshold {
			if !(t >= 0.) {
				return Err(ConfigError::InvalidThreshold(t));
			}
		}
		let image = image.clone();
		let mut root = Quadrant::new(0, 0, width, height, 0);
		build(&image, &options, &mut root);
		let tree = QuadTree { image, options, root };
		debug!(
			width,
			height,
			leaves = tree.leaves().len(),
			max_depth = tree.max_depth(),
			"built quadtree"
		);
		Ok(tree)
	}

	pub fn root(&self) -> &Quadrant {
		&self.root
	}

	/// The tree's own copy of the source image.
	pub fn image(&self) -> &RgbImage {
		&self.image
	}

	pub fn options(&self) -> BuildOptions {
		self.options
	}

	/// Deepest level reached by any leaf; 0 for an unsplit root.
	pub fn max_depth(&self) -> u32 {
		max_depth(&self.root)
	}

	/// All leaves, depth-first, sections visited top-left, top-right,
	/// bottom-left, bottom-right.
	///
	/// The serialized format depends on this order.
	pub fn leaves(&self) -> Vec<&Quadrant> {
		let mut out = Vec::new();
		collect_leaves(&self.root, &mut out);
		out
	}
}

/// Decides whether `node` should be split, and if so splits it and
/// recurses into the sections. Leaves always leave with their color set.
fn build(image: &RgbImage, options: &BuildOptions, node: &mut Quadrant) {
	match split(image, options, node) {
		Some(sections) => node.attach(sections),
		None => {
			node.mean_color(&*node.extract(image));
		}
	}
}

/// Builds the four sections of `node`, or `None` if `node` stays a leaf.
fn split(image: &RgbImage, options: &BuildOptions, node: &mut Quadrant) -> Option<[Quadrant; 4]> {
	if let Some(threshold) = options.threshold {
		if node.error(image) <= threshold {
			return None;
		}
	}

	// Floor/ceil halves, so odd sizes still tile exactly.
	let (bottom_w, top_w) = (node.width / 2, node.width - node.width / 2);
	let (bottom_h, top_h) = (node.height / 2, node.height - node.height / 2);

	if bottom_w < 1 || bottom_h < 1 {
		return None;
	}
	if let Some(min) = options.min_quad_size {
		if bottom_w < min || bottom_h < min {
			return None;
		}
	}

	let (x, y) = node.origin;
	let depth = node.depth + 1;
	let mut sections = [
		Quadrant::new(x, y, bottom_w, bottom_h, depth),
		Quadrant::new(x + bottom_w, y, top_w, bottom_h, depth),
		Quadrant::new(x, y + bottom_h, bottom_w, top_h, depth),
		Quadrant::new(x + bottom_w, y + bottom_h, top_w, top_h, depth),
	];
	for section in sections.iter_mut() {
		build(image, options, section);
	}
	Some(sections)
}

fn max_depth(node: &Quadrant) -> u32 {
	match node.sections() {
		Some(sects) => sects.iter().map(max_depth).max().unwrap_or(node.depth),
		None => node.depth,
	}
}

fn collect_leaves<'a>(node: &'a Quadrant, out: &mut Vec<&'a Quadrant>) {
	match node.sections() {
		Some(sects) => sects.iter().for_each(|s| collect_leaves(s, out)),
		None => out.push(node),
	}
}
