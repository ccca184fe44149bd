pub mod error;
pub mod fingerprint;
pub mod icons;
pub mod ids;
pub mod markup;
pub mod model;
pub mod outcome;
pub mod selection;

pub use error::*;
pub use fingerprint::*;
pub use icons::*;
pub use ids::*;
pub use markup::*;
pub use model::*;
pub use outcome::*;
pub use selection::*;
