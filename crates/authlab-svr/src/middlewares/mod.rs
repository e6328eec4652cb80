mod bearer;
mod trace;

pub use bearer::*;
pub use trace::*;
