// Copyright @yucwang 2021

pub mod config;
pub mod config_loader;
pub mod emitter;
pub mod error;
pub mod rng;
