// Copyright @yucwang 2021

pub extern crate nalgebra as na;

pub mod cache;
pub mod core;
pub mod emitters;
pub mod io;
pub mod math;
