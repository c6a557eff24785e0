pub mod interpreter;
pub mod io;
pub mod ops;
pub mod scope;
pub mod value;
