pub mod convert;
pub mod serve;
