//! Flutter-facing bindings for PrepNote core.

pub mod api;
