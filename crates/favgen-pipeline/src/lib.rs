pub mod config;
pub mod doctor;
pub mod persist;
pub mod pipeline;
pub mod publish;
pub mod resolve;
pub mod workspace;

pub use config::*;
pub use doctor::*;
pub use persist::*;
pub use pipeline::*;
pub use publish::*;
pub use resolve::*;
pub use workspace::*;
