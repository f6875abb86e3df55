//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter         | Implements      | Connects to                          |
//! |-----------------|-----------------|--------------------------------------|
//! | `hardware`      | LedHardware     | LP5562 / AW210xx / IR drivers        |
//! | `log_sink`      | env_logger      | stdout / stderr                      |
//! | `notify`        |                 | status FIFO → `StatusFlags`          |
//! | `record_file`   |                 | flock-guarded record files           |
//! | `status_probe`  | StatusOracle    | marker files, route table, `ping`    |
//! | `sysfs`         | AttributeWriter | sysfs attributes, privileged helper  |

pub mod hardware;
pub mod log_sink;
pub mod notify;
pub mod record_file;
pub mod status_probe;
pub mod sysfs;
pub mod utils;
