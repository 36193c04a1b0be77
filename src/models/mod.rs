pub mod device;
pub mod user;

pub use device::Device;
pub use user::{User, UserId};
