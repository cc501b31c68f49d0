//! mk runtime: engine session lifecycle and the seams to the map engine.
//!
//! - **Session**: script injection, token acquisition and refresh, one-time
//!   engine init, shared by every consumer through a single `ready()`
//! - **Engine seams**: [`Engine`], [`EngineMap`], [`EngineAnnotation`],
//!   [`EngineOverlay`], [`HostContainer`], [`ScriptHost`]
//! - **Cleanup**: idempotent teardown callbacks and their registry
//! - **Headless engine**: a recording in-process engine for tests and tools
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │    mk-rs    │  Scene reconciler, callouts, viewport
//! └──────┬──────┘
//!        │ drives
//! ┌──────▼──────┐
//! │  mk-runtime │  This crate
//! │  ┌────────┐ │
//! │  │Session │ │  ready() / reset() / leases
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Engine │ │  trait seams + headless engine
//! │  └────────┘ │
//! └─────────────┘
//! ```

pub mod cleanup;
pub mod dom;
pub mod engine;
pub mod error;
pub mod headless;
pub mod inflight;
pub mod retry;
pub mod script;
pub mod session;
pub mod token;

pub use cleanup::{Cleanup, CleanupKey, CleanupRegistry};
pub use dom::{DomNode, DomTree, ElementHandle, NodeId};
pub use engine::{
	AnnotationAppearance, AnnotationEvent, AnnotationEventKind, AnnotationInit, CalloutDelegate, ClusterAnnotation,
	ClusterFactory, CoordinateRegion, CoordinateSpan, DomPoint, DomRect, EdgePadding, ElementFactory, Engine,
	EngineAnnotation, EngineInit, EngineMap, EngineOverlay, HostContainer, LatLng, ListenerId, MapEvent, MapEventDetail,
	MapEventKind, OverlayInit, OverlayShape,
};
pub use error::{Error, ErrorCode, Result};
pub use retry::RetryPolicy;
pub use script::{ScriptHost, ScriptLoader, ScriptResource};
pub use session::{ErrorListener, ErrorSubscription, Session, SessionLease, SessionPhase};
pub use token::{TOKEN_BUFFER, Token, TokenManager, TokenProvider};
