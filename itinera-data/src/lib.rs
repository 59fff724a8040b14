//! Routing adapters for the Itinera engine.
//!
//! Responsibilities:
//! - Implement [`itinera_core::TravelTimeProvider`] over external routing
//!   services and offline estimates.
//! - Translate service responses and transport failures into
//!   [`itinera_core::TravelTimeError`].
//!
//! Boundaries:
//! - Do not encode scheduling or scoring rules (live in `itinera-core`).
//! - Do not cache; callers wrap providers in [`itinera_core::TravelTimeCache`].

#![forbid(unsafe_code)]

pub mod routing;
