pub mod sanitize;

pub use sanitize::safe_str;
