pub mod dedup;
pub mod generate;
