pub mod data_model;
pub mod layout;
pub mod merge;
pub mod projection;
pub mod table_state;
