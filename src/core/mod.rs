pub mod cell_list;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod spatial;
