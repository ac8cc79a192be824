//! Request and response bodies

pub mod cores;
