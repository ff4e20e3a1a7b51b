//! Behavior and resource pack handling
//!
//! - [`manifest`] - parsing `manifest.json` and deciding a pack's category
//! - [`registry`] - the per-world `world_*_packs.json` files
//! - [`installer`] - extracting uploaded archives and registering their packs
//!
//! Uploads are validated against the target world before anything is
//! extracted; every pack in a bundle is handled independently so one broken
//! pack does not block the rest.

pub mod installer;
pub mod manifest;
pub mod registry;

pub use installer::{InstalledPack, PackInstaller};
pub use manifest::{PackCategory, PackManifest, PackVersion};
pub use registry::{RegistryEntry, WorldPackRegistry};
