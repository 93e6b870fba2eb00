pub mod bus;
pub mod component;
pub mod input;
pub mod machine;
pub mod sink;

pub use bus::{Bus, BusMaster};
pub use component::{BusMasterComponent, Component};
pub use input::InputButton;
pub use machine::Machine;
pub use sink::{AudioSink, NullSink, PixelSink};
