//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements     | Connects to                 |
//! |---------------|----------------|-----------------------------|
//! | `csv_replay`  | ReadingSource  | Photodiode telemetry CSV    |
//! | `log_sink`    | EventSink      | `log` facade                |
//! | `audit_log`   | EventSink      | JSON-lines audit file       |
//! | `config_file` | ConfigPort     | JSON config file on disk    |

pub mod audit_log;
pub mod config_file;
pub mod csv_replay;
pub mod log_sink;
