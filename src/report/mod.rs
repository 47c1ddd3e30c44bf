//! Dashboard report rendering.

pub mod generator;

pub use generator::{
    generate_count_table, generate_json_report, generate_markdown_report, generate_options_text,
    write_report,
};
