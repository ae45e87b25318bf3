//! Command implementations.

pub mod answers;
pub mod doctor;
pub mod helpers;
pub mod init;
pub mod repair;
pub mod status;
pub mod submit;

pub use answers::run_answers;
pub use doctor::run_doctor;
pub use init::run_init;
pub use repair::run_repair;
pub use status::run_status;
pub use submit::run_submit;
