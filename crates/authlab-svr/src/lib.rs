pub mod issuer;
pub mod middlewares;
pub mod router;
mod state;

pub use state::AppState;
