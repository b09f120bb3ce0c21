//! Raw input device nodes: discovery, capability probing and event writes.

mod emit;
mod probe;
mod scan;

pub use emit::{EvemuSink, NativeSink};
pub use probe::{Capabilities, CapabilityProbe, EvemuProbe, NativeProbe};
pub use scan::{DeviceScanner, InputDevice, TEST_NO_DEVICE_ENV};
