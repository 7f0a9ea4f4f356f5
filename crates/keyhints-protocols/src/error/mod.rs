//! Error types for the keyhints protocol layer.

mod completion;
mod hint;
mod kernel;
mod protocol;
mod transport;

pub use completion::*;
pub use hint::*;
pub use kernel::*;
pub use protocol::*;
pub use transport::*;
