//! Solver-proxy layer: upstream channel fetches through the anti-bot
//! solver, plus extraction of the JSON document the solver returns wrapped
//! in an HTML envelope.

pub mod client;
pub mod html;

pub use client::{FetchedChannel, SolverClient};
pub use html::extract_embedded_json;
