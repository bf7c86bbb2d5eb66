pub mod retry;
pub mod sequence;
