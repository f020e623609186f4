pub mod huffman;
pub mod node;

pub use node::*;
pub use node::lima::{parse_lima, read_compressed_file};
pub use node::tree::{BuildOptions, QuadTree};
