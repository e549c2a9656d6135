mod cached;
mod certificate;
mod response;

pub use cached::*;
pub use certificate::*;
pub use response::*;
