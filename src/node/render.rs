use image::{Rgb, RgbImage};

use super::tree::QuadTree;

/// Fills `[x0, x1) x [y0, y1)` of `img` with `color`.
fn fill(img: &mut RgbImage, (x0, y0): (u32, u32), (x1, y1): (u32, u32), color: Rgb<u8>) {
	for y in y0..y1 {
		for x in x0..x1 {
			img.put_pixel(x, y, color);
		}
	}
}

/// Draws a 1-pixel outline on the closed rectangle `(x0, y0)`-`(x1, y1)`,
/// dropping whatever falls outside `img`.
fn outline(img: &mut RgbImage, (x0, y0): (u32, u32), (x1, y1): (u32, u32), color: Rgb<u8>) {
	let (w, h) = img.dimensions();
	let mut plot = |x: u32, y: u32| if x < w && y < h {
		img.put_pixel(x, y, color);
	};
	for x in x0..=x1 {
		plot(x, y0);
		plot(x, y1);
	}
	for y in y0..=y1 {
		plot(x0, y);
		plot(x1, y);
	}
}

impl QuadTree {
	/// Reconstructs the compressed image: every leaf's area painted with
	/// its mean color in the source image.
	pub fn render(&self) -> RgbImage {
		let (width, height) = self.image().dimensions();
		let mut out = RgbImage::new(width, height);
		for leaf in self.leaves() {
			let (x, y) = leaf.origin;
			fill(
				&mut out,
				(x, y),
				(x + leaf.width, y + leaf.height),
				leaf.color_in(self.image()),
			);
		}
		out
	}

	/// Like `render`, but with the outline of every leaf drawn over the
	/// fills in `highlight`.
	///
	/// Neighboring outlines share their boundary pixels.
	pub fn render_outlined(&self, highlight: Rgb<u8>) -> RgbImage {
		let mut out = self.render();
		for leaf in self.leaves() {
			let (x, y) = leaf.origin;
			outline(&mut out, (x, y), (x + leaf.width, y + leaf.height), highlight);
		}
		out
	}
}
