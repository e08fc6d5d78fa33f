//! Application use cases / business logic

pub mod echo;
pub mod render;
pub mod run_loop;
pub mod validate;

pub use echo::{EchoConfig, EchoResponder};
pub use render::{RenderConfig, Renderer};
pub use run_loop::{CycleError, PollLoop, PollLoopConfig};
pub use validate::{ValidationError, decode_listings, validate_response};
