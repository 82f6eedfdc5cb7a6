pub mod cache;
pub mod migrate;
pub mod run;
pub mod runs;
