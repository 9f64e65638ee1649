pub mod device;
pub mod field;

pub use device::{DeviceRecord, PLACEHOLDERS, concrete, is_placeholder};
pub use field::DeviceField;
