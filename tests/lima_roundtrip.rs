use image::{Rgb, RgbImage};
use proptest::prelude::*;

use quadtree_lima::error::{FormatError, ReadError};
use quadtree_lima::{read_compressed_file, BuildOptions, QuadTree};

fn arb_image() -> impl Strategy<Value = RgbImage> {
	(1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
		proptest::collection::vec(0u8..=255, (w * h * 3) as usize)
			.prop_map(move |raw| RgbImage::from_raw(w, h, raw).unwrap())
	})
}

fn arb_options() -> impl Strategy<Value = BuildOptions> {
	(
		proptest::option::of(0f64..80.),
		proptest::option::of(0u32..6),
	).prop_map(|(threshold, min_quad_size)| BuildOptions { threshold, min_quad_size })
}

/// Smallest `d` with `2^d >= n`.
fn ceil_log2(n: u32) -> u32 {
	32 - (n - 1).leading_zeros()
}

proptest! {
	#[test]
	fn test_leaves_tile_the_image(img in arb_image(), opts in arb_options()) {
		let tree = QuadTree::new(&img, opts).unwrap();
		let (w, h) = img.dimensions();
		let mut cover = vec![0u8; (w * h) as usize];
		let mut area = 0;
		for leaf in tree.leaves() {
			prop_assert!(leaf.width > 0 && leaf.height > 0);
			area += leaf.area();
			for y in leaf.origin.1..leaf.origin.1 + leaf.height {
				for x in leaf.origin.0..leaf.origin.0 + leaf.width {
					cover[(y * w + x) as usize] += 1;
				}
			}
		}
		prop_assert_eq!(area, w as u64 * h as u64);
		prop_assert!(cover.iter().all(|c| *c == 1));
	}

	#[test]
	fn test_depth_is_logarithmic(img in arb_image(), opts in arb_options()) {
		let tree = QuadTree::new(&img, opts).unwrap();
		let (w, h) = img.dimensions();
		prop_assert!(tree.max_depth() <= ceil_log2(w.max(h)));
	}

	#[test]
	fn test_parsed_text_matches_render(img in arb_image(), opts in arb_options()) {
		let tree = QuadTree::new(&img, opts).unwrap();
		let text = tree.to_lima().unwrap();
		prop_assert_eq!(quadtree_lima::parse_lima(&text).unwrap(), tree.render());
	}
}

#[test]
fn test_file_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let img = RgbImage::from_fn(33, 20, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8]));
	let tree = QuadTree::new(&img, BuildOptions { threshold: Some(12.), min_quad_size: Some(2) }).unwrap();

	let path = tree.write_compressed_file(Some(dir.path()), Some("gradient")).unwrap();
	assert_eq!(path, dir.path().join("gradient.lima"));
	assert_eq!(std::fs::read_to_string(&path).unwrap(), tree.to_lima().unwrap());
	assert_eq!(read_compressed_file(&path).unwrap(), tree.render());
}

#[test]
fn test_two_by_two_file() {
	let dir = tempfile::tempdir().unwrap();
	let img = RgbImage::from_fn(2, 2, |_, y| if y == 0 { Rgb([0; 3]) } else { Rgb([255; 3]) });
	let tree = QuadTree::new(&img, BuildOptions { threshold: Some(10.), min_quad_size: Some(1) }).unwrap();
	let path = tree.write_compressed_file(Some(dir.path()), Some("stripes")).unwrap();
	assert_eq!(
		std::fs::read_to_string(&path).unwrap(),
		"2;2&0;0;1;1;0,0,0&1;0;2;1;0,0,0&0;1;1;2;255,255,255&1;1;2;2;255,255,255"
	);
	assert_eq!(read_compressed_file(&path).unwrap(), img);
}

#[test]
fn test_malformed_file_aborts() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("broken.lima");
	std::fs::write(&path, "2;2&0;0;1;1;0,0,0&1;0;2;1;oops").unwrap();
	match read_compressed_file(&path) {
		Err(ReadError::Format(FormatError::MalformedRecord { index, .. })) => assert_eq!(index, 1),
		other => panic!("unexpected result: {:?}", other),
	}
}

#[test]
fn test_missing_file_is_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let err = read_compressed_file(dir.path().join("absent.lima")).unwrap_err();
	assert!(matches!(err, ReadError::Io(_)));
}

#[test]
fn test_write_into_missing_directory_fails() {
	let dir = tempfile::tempdir().unwrap();
	let img = RgbImage::from_pixel(4, 4, Rgb([3, 3, 3]));
	let tree = QuadTree::new(&img, BuildOptions::default()).unwrap();
	let missing = dir.path().join("nope");
	assert!(tree.write_compressed_file(Some(missing.as_path()), Some("x")).is_err());
}
