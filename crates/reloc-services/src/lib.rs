//! Move engine for reloc
//!
//! Relocates a module file from one project of a workspace to another and
//! rewrites every reference to it. See [`services::move_service::MoveService`]
//! for the entry point.

pub mod services;

pub use services::move_service::{
    Formatter, MoveContext, MoveOptions, MoveReport, MoveRequest, MoveService, MoveStrategy,
    MoveTarget,
};
