pub mod ai;
pub mod io;
pub mod proxy;
pub mod table;
