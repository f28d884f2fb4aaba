//! Embassy async tasks
//!
//! Each task runs independently and communicates through the statics in
//! [`crate::channels`].

pub mod link_rx;
pub mod link_tx;
pub mod scheduler;
pub mod sensor;

pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use scheduler::scheduler_task;
pub use sensor::sensor_task;
