//! Synchronous bridge from declarative content to engine nodes.
//!
//! The engine asks for callout nodes from inside its own event handling and
//! cannot wait, so content is mounted into a detached subtree on the spot
//! and handed over as an [`ElementHandle`](mk_runtime::ElementHandle).

mod bridge;
pub mod placement;
pub mod render;
mod spec;

pub use bridge::{CalloutBridge, MountScope, MountSlot};
pub use placement::{PlacementStrategy, ThreeZonePlacement, Zone, to_container_space};
pub use render::{ArenaRenderer, COMPONENT_PLACEHOLDER, ContentRenderer, is_safe_attribute, mount_detached};
pub use spec::{CalloutSlots, CalloutSpec, ContentFn};
