//! `mk` command-line front end.
//!
//! Replays scene documents against a headless engine session and validates
//! them offline. Scene documents are JSON:
//!
//! ```json
//! {
//!   "items": [
//!     { "annotation": { "kind": "marker", "coordinate": { "latitude": 1.0, "longitude": 2.0 } } },
//!     { "overlay": { "kind": "circle", "center": { "latitude": 1.0, "longitude": 2.0 }, "radius": 500.0 } }
//!   ],
//!   "location": { "latitude": 1.0, "longitude": 2.0 }
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
