pub mod assign;
pub mod migrate;
pub mod search;
pub mod shared;
pub mod show;
pub mod sync;
