//! Shared UI components for the dashboard.

pub mod error_alert;
pub mod form_inputs;
pub mod header;
pub mod layout;
pub mod nav;
pub mod query_view;
pub mod stat_tile;

pub use error_alert::ErrorAlert;
pub use form_inputs::{ProjectSelect, TextField, TimeRangeSelect};
pub use header::Header;
pub use layout::{AuthShell, Layout, PageHeader};
pub use nav::Nav;
pub use query_view::{query_view, EmptyState, ErrorState, Loading};
pub use stat_tile::StatTile;
