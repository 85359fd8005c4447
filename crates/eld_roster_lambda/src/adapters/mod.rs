pub mod allocation_table;
pub mod hero;
pub mod object_store;
pub mod upstream;
pub mod zero;
