mod bounds;
pub use self::bounds::*;

mod statistics;
pub use self::statistics::*;
