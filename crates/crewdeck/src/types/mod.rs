mod artifact;
mod configuration;
mod error;
mod execution_event;
mod id;
mod model_status;
mod session;
mod upload;

pub use artifact::*;
pub use configuration::*;
pub use error::*;
pub use execution_event::*;
pub use id::*;
pub use model_status::*;
pub use session::*;
pub use upload::*;
