pub mod modules;
pub mod report;
pub mod totals;
pub mod util;

pub use modules::*;
pub use report::*;
pub use totals::*;
pub use util::*;
