pub mod device;

pub use device::{Device, DeviceState, StateListener};
