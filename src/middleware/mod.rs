pub mod profiler;

pub use profiler::{inject_toolbar, is_ajax, is_interactive, profile_request};
