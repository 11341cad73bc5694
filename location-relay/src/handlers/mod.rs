pub mod health;
pub mod location;
pub mod page;

pub use health::{health_check, metrics};
pub use location::submit_location;
pub use page::{location_page, render_page, LocationPage};
