//! # Primitivas de Sincronización
//!
//! Semáforo contador usado por el pool de workers para señalizar
//! "hay trabajo" y "hay espacio en el backlog".

pub mod semaphore;

pub use semaphore::{CountingSemaphore, Semaphore};
