mod blockchain;
mod operation;

pub use blockchain::*;
pub use operation::*;
