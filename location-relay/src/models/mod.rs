pub mod location;

pub use location::{LocationReport, LocationSubmission};
