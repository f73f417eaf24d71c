pub mod libs;

pub use libs::io::reader;
