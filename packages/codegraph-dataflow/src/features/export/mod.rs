//! Export of result tables and graphs

pub mod dot;
pub mod json;

pub use dot::{call_graph_to_dot, exploded_to_dot, icfg_to_dot};
pub use json::{to_json_string, write_json, write_text};
