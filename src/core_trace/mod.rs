pub mod tracer;

pub use tracer::{FtpTraceObserver, FtpTracer, LogTraceObserver, TraceEvent};
