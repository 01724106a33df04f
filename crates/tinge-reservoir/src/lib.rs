pub mod bucket;
pub mod error;
pub mod network;
pub mod tap;

pub use bucket::Bucket;
pub use error::{ReservoirError, Result};
pub use network::ReservoirNetwork;
pub use tap::{Tap, TapRate};
