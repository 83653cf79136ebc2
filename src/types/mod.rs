mod category;
mod coord;
mod feature;

pub use category::*;
pub use coord::*;
pub use feature::*;
