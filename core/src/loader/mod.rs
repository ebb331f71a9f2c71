pub mod collection;
pub mod format;
pub mod nodes;

pub use collection::{discover, load_collection, LoaderOptions, ScanCollection};
pub use format::{parse_scan, read_scan, save_scan, write_scan};
pub use nodes::{drill_start, read_nodes, DrillStart};
