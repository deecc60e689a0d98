mod xyz_reader;
pub use self::xyz_reader::*;
