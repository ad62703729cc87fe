pub(crate) mod encoder;
pub(crate) mod event;
pub(crate) mod sink;

pub use encoder::{encode_event, format_float, format_value};
pub use event::{FieldValue, Position, TelemetryEvent};
pub use sink::EventLogSink;
