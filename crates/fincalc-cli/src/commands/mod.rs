pub mod bonds;
pub mod mortgage;
pub mod tvm;
pub mod xirr;
