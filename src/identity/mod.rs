// Identity module - account addresses for airlines, passengers and reporters

mod address;

pub use address::*;
