//! UI Module - terminal output for the `four` commands
//!
//! ```text
//! ┌─────────────┐
//! │  Commands   │  (build, run, info)
//! └──────┬──────┘
//!        │ uses (also as four_core::Reporter)
//!        ▼
//! ┌─────────────┐
//! │   Output    │  Public API, cheap to clone
//! └──────┬──────┘
//!        │ sends events
//!        ▼
//! ┌─────────────┐
//! │    Actor    │  Single thread that owns stdout
//! └──────┬──────┘
//!        │ styles with
//!        ▼
//! ┌─────────────┐
//! │    Theme    │  Colors and icons
//! └─────────────┘
//! ```

pub mod actor;
pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
