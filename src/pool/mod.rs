//! # Pool de Workers
//!
//! Convierte un flujo ilimitado de conexiones entrantes en una cantidad fija
//! de trabajo concurrente:
//!
//! - `queue`: Cola FIFO de tareas protegida por un único mutex
//! - `thread_pool`: Workers + semáforos de trabajo disponible y backlog

pub mod queue;
pub mod thread_pool;

pub use queue::{Task, TaskQueue};
pub use thread_pool::WorkerPool;
