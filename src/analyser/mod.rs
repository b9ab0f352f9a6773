pub mod inference;
pub mod logic;
