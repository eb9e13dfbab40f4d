#[allow(clippy::module_inception)]
pub mod container;
pub mod descriptor;

pub use container::Container;
pub use descriptor::{Descriptor, DescriptorHandle, Value};
