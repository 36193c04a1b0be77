mod check;
mod devices;
mod login;

pub use check::cmd_check;
pub use devices::cmd_devices;
pub use login::cmd_login;
