#![allow(clippy::deref_addrof)]

pub mod prelude;

pub mod diis;
pub mod error;
pub mod iteration;
pub mod rccsd;
pub mod resolvent;
pub mod structs;
pub mod synthetic;
pub mod util;
