pub mod board;
pub mod engine;
pub mod game;
pub mod moves;
pub mod orientation;
pub mod piece;

#[cfg(not(target_arch = "wasm32"))]
pub mod session;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
