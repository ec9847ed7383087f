pub mod volume_io;

pub use volume_io::{list_slices, load_slice, load_stack, load_stack_files, save_stack};
