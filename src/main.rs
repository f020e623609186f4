use image::error::ImageError;
use image::Rgb;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use quadtree_lima::error::{PersistError, ReadError};
use quadtree_lima::lima::output_target;
use quadtree_lima::{huffman, read_compressed_file, BuildOptions, QuadTree};

use std::path::Path;

/// Outline color for `--outline` previews.
const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 0]);

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	error!("{}", msg);
	std::process::exit(code)
}

fn image_error_exit(e: ImageError) -> ! {
	let (msg, code) = match e {
		ImageError::Decoding(_) => ("Invalid image data", 4),
		ImageError::Limits(_) => ("Computation limits exceeded", 5),
		ImageError::IoError(_) => ("File not found or could not be read", 3),
		_ => ("An error occurred", 10)
	};
	error_exit(msg, code)
}

/// `INPUT` with its extension replaced by `ext`.
fn swap_extension(input: &str, ext: &str) -> String {
	Path::new(input).with_extension(ext).to_string_lossy().into_owned()
}

/// `clap`-based CLI for working with LIMA files.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 5: computation limits exceeded
///
/// 10: other, potentially unknown error
fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();

	let clap_matches = clap::App::new("quadtree_lima")
		.version("0.1.0")
		.author("vkcz")
		.about("Converts to and from a quadtree-based lossy image format (LIMA).")
		.arg_from_usage("-i, --into 'Convert the input file from PNG, JFIF or BMP to LIMA'")
		.arg_from_usage("-f, --from 'Convert the input file from LIMA to PNG'")
		.arg_from_usage("-t, --threshold=[T] 'Largest RMS color error kept as one block (--into only); \"none\" disables; defaults to 30'")
		.arg_from_usage("-m, --min-size=[N] 'Smallest block edge (--into only); \"none\" disables; defaults to 10'")
		.arg_from_usage("-p, --preview=[PNG] 'Also write the reconstructed image here (--into only)'")
		.arg_from_usage("-o, --outline 'Draw block outlines on the preview'")
		.arg_from_usage("-e, --entropy 'Report the Huffman-coded size of the output (--into only)'")
		.arg_from_usage("<INPUT> 'Path to input file'")
		.arg_from_usage("[OUTPUT] 'Path to output file (.lima for --into); defaults to INPUT with a modified file extension'")
		.get_matches();

	let input_path = match clap_matches.value_of("INPUT") {
		Some(p) => p,
		None => error_exit("Missing input path", 2)
	};
	let (into, from) = (clap_matches.is_present("into"), clap_matches.is_present("from"));
	match (into, from) {
		(true, true) => error_exit("Only one of -i/--into and -f/--from must be present", 2),
		(true, false) => {
			let source = match image::open(input_path) {
				Ok(i) => i,
				Err(e) => image_error_exit(e)
			}.into_rgb8();
			let threshold = match clap_matches.value_of("threshold").unwrap_or("30") {
				"none" => None,
				t => match t.parse::<f64>() {
					Ok(n) => Some(n),
					Err(_) => error_exit("Non-numeric value for threshold", 2)
				}
			};
			let min_quad_size = match clap_matches.value_of("min-size").unwrap_or("10") {
				"none" => None,
				n => match n.parse::<u32>() {
					Ok(n) => Some(n),
					Err(_) => error_exit("Non-numeric value for min-size", 2)
				}
			};
			let tree = match QuadTree::new(&source, BuildOptions { threshold, min_quad_size }) {
				Ok(t) => t,
				Err(e) => error_exit(&e.to_string(), 2)
			};
			info!(leaves = tree.leaves().len(), max_depth = tree.max_depth(), "compressed image");

			let output = clap_matches.value_of("OUTPUT")
				.map(str::to_string)
				.unwrap_or_else(|| swap_extension(input_path, quadtree_lima::lima::EXTENSION));
			let (dir, name) = match output_target(Path::new(&output)) {
				Ok(t) => t,
				Err(e) => error_exit(&e.to_string(), 2)
			};
			match tree.write_compressed_file(Some(dir), name) {
				Ok(_) => (),
				Err(PersistError::Config(e)) => error_exit(&e.to_string(), 2),
				Err(PersistError::Io(_)) => error_exit("Could not write to output file", 3),
				Err(PersistError::Encode(e)) => error_exit(&e.to_string(), 10)
			}

			if clap_matches.is_present("entropy") {
				// `.expect()` is valid here: every leaf had its color set while
				// the tree was built, so encoding can't fail.
				let text = tree.to_lima().expect("failure to serialize to LIMA");
				match huffman::encode(&text) {
					Ok((bits, _)) => info!(
						text_bytes = text.len(),
						huffman_bytes = (bits.len() + 7) / 8,
						"entropy-coded size"
					),
					Err(e) => error!("{}", e)
				}
			}

			if let Some(preview) = clap_matches.value_of("preview") {
				let rendered = if clap_matches.is_present("outline") {
					tree.render_outlined(HIGHLIGHT)
				} else {
					tree.render()
				};
				if rendered.save(preview).is_err() {
					error_exit("Could not save preview", 3)
				}
			}
		},
		(false, true) => {
			let output = match read_compressed_file(input_path) {
				Ok(img) => img,
				Err(ReadError::Io(_)) => error_exit("File not found or could not be read", 3),
				Err(ReadError::Format(e)) => error_exit(&e.to_string(), 4)
			};
			match output.save(clap_matches.value_of("OUTPUT")
				.map(str::to_string)
				.unwrap_or_else(|| swap_extension(input_path, "png"))) {
				Ok(_) => (),
				Err(_) => error_exit("Could not save output", 3)
			}
		},
		(false, false) => error_exit("One of -i/--into and -f/--from must be present", 2)
	}
}
