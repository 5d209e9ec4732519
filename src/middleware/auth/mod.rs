pub mod enforce;
pub mod verify;

pub use enforce::EnforcePolicy;
