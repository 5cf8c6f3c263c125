//! Sketch domain: models, vector path codec, and the user-facing service.

mod codec;
mod model;
mod path;
mod service;

pub use codec::*;
pub use model::*;
pub use path::*;
pub use service::*;
