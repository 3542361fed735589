pub mod responses;

pub use responses::{ListEnvelope, SlugEnvelope};
