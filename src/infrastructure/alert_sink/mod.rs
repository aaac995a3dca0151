pub mod file_sink;
pub mod in_memory;

pub use file_sink::FileAlertSink;
pub use in_memory::InMemoryAlertSink;
