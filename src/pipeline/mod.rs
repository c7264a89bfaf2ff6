pub mod calories;
pub mod distance;
pub mod elevation;
pub mod parse;
pub mod summarize;
pub mod temporal;
