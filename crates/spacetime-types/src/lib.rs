//! Shared type definitions for the emergent-spacetime workspace.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries and leave the process in run snapshots. Types flow downstream
//! to `TypeScript` via `ts-rs` for graph viewers.
//!
//! # Modules
//!
//! - [`ids`] -- Event and run identifiers
//! - [`enums`] -- [`Distance`] and [`ConeDirection`]
//! - [`structs`] -- [`Position`], [`AmbientBounds`], [`Event`], [`CausalEdge`]

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ConeDirection, Distance};
pub use ids::{EventId, RunId};
pub use structs::{AmbientBounds, CausalEdge, Event, Position};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::RunId::export_all();

        let _ = crate::enums::Distance::export_all();
        let _ = crate::enums::ConeDirection::export_all();

        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::AmbientBounds::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::CausalEdge::export_all();
    }
}
