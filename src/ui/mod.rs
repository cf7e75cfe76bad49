pub mod actions;
pub mod app;
pub mod preview;
pub mod table;
pub mod toolbar;
