pub mod limit_up;
pub mod performance;
pub mod pipeline;
pub mod response;

pub use limit_up::*;
pub use performance::*;
pub use pipeline::*;
pub use response::*;
