//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements              | Connects to                 |
//! |-----------------|-------------------------|-----------------------------|
//! | `config_store`  | ConfigPort, StoragePort | postcard blob in RAM store  |
//! | `hardware`      | BoardPort               | ESP32 ADC1, GPIO            |
//! |                 | EnvironmentPort         | simulated T/H/P chip        |
//! | `log_sink`      | PublishPort             | Serial log output (JSON)    |
//! | `publish_queue` | PublishPort             | Bounded queue for transport |
//! | `time`          | ClockPort               | ESP32 system timer          |

pub mod config_store;
pub mod hardware;
pub mod log_sink;
pub mod publish_queue;
pub mod time;
