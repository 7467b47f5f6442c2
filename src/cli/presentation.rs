//! CLI presentation: text and json formatters per command family.

mod config;
mod generate;
mod plan;
mod shared;

pub use config::format_config;
pub use generate::format_generate_summary;
pub use plan::{format_plan_json, format_plan_text};
