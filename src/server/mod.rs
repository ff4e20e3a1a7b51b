//! The server's own on-disk configuration
//!
//! - [`properties`] - `server.properties` reading and in-place editing
//! - [`worlds`] - world listing and activation via `level-name`

pub mod properties;
pub mod worlds;

pub use properties::{ServerProperties, read_properties, write_properties};
pub use worlds::{activate_world, list_worlds};
