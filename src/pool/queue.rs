//! # Cola FIFO de Tareas
//! src/pool/queue.rs
//!
//! Cola thread-safe compartida por todos los workers del pool. Es la única
//! estructura del servidor protegida con un mutex, y el lock solo se mantiene
//! durante el push/pop, nunca mientras se ejecuta una tarea.

use crate::error::HttpError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Unidad de trabajo encolada por el dispatcher
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Estado protegido por el mutex
struct QueueState {
    tasks: VecDeque<Task>,

    /// Una vez cerrada la cola no acepta más tareas
    closed: bool,
}

/// Cola FIFO de tareas
pub struct TaskQueue {
    state: Mutex<QueueState>,
}

impl TaskQueue {
    /// Crea una cola vacía y abierta
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola una tarea al final
    ///
    /// El chequeo de `closed` y el push ocurren bajo el mismo lock, así que
    /// ninguna tarea puede colarse después de `close()`.
    pub fn push(&self, task: Task) -> Result<(), HttpError> {
        let mut state = self.lock();
        if state.closed {
            return Err(HttpError::PoolClosed);
        }
        state.tasks.push_back(task);
        Ok(())
    }

    /// Desencola la tarea más antigua, si hay
    pub fn pop(&self) -> Option<Task> {
        self.lock().tasks.pop_front()
    }

    /// Cierra la cola. Las tareas ya encoladas se conservan.
    ///
    /// Retorna `true` si la cola estaba abierta.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let was_open = !state.closed;
        state.closed = true;
        was_open
    }

    /// Indica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Retorna el número de tareas pendientes
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
