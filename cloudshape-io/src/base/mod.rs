mod reader;
pub use self::reader::*;
