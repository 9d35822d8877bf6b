// Copyright (c) 2018-2022 The Botho Foundation

//! Logging.
//!
//! All crates log through the `tracing` macros; this module only decides
//! where the events go. Verbosity is controlled with `RUST_LOG` (or
//! `RSM_LOG`).

pub use tracing::{debug, error, info, trace, warn};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "log", feature = "std"))] {
        use std::{format, string::String, time::Instant};

        /// Emits a trace event with the elapsed time when dropped.
        ///
        /// Prefer `#[tracing::instrument]` on functions; this is for timing a
        /// block inside one.
        #[macro_export]
        macro_rules! trace_time {
            ($($arg:tt)+) => {
                let _trace_time = $crate::logger::TraceTime::new(format!($($arg)+));
            }
        }

        /// Timer behind [trace_time].
        pub struct TraceTime {
            msg: String,
            start: Instant,
        }

        impl TraceTime {
            /// Start a timer with the given message.
            pub fn new(msg: String) -> Self {
                Self {
                    msg,
                    start: Instant::now(),
                }
            }
        }

        impl Drop for TraceTime {
            fn drop(&mut self) {
                let time_in_ms = self.start.elapsed().as_secs_f64() * 1000.0;

                let time = match time_in_ms as u64 {
                    0..=3000 => format!("{time_in_ms:.2}ms"),
                    3001..=60000 => format!("{:.2}s", time_in_ms / 1000.0),
                    _ => format!("{:.2}m", time_in_ms / 1000.0 / 60.0),
                };

                tracing::trace!(duration_ms = time_in_ms, "{}: took {}", self.msg, time);
            }
        }

        #[cfg(test)]
        mod trace_time_tests {
            use std::format;

            #[test]
            fn basic_trace_time() {
                {
                    trace_time!("test inner");
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }

                trace_time!("test outer {}", 1);
            }
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "log", feature = "loggers"))] {
        mod loggers;
        pub use loggers::*;
    }
}
