//! # Pool de Workers Acotado
//! src/pool/thread_pool.rs
//!
//! Un número fijo de threads worker consume tareas de una cola FIFO común.
//! Dos semáforos coordinan todo:
//!
//! - `work_available`: se postea una vez por tarea encolada y una vez por
//!   worker al hacer `shutdown()`.
//! - `backlog_slots` (opcional): arranca en el límite del backlog; `submit`
//!   lo espera antes de encolar y el worker lo postea al desencolar.
//!
//! Un worker que despierta y encuentra la cola vacía termina. Como las
//! señales de shutdown se postean después de todas las tareas, cada tarea
//! encolada antes del cierre se ejecuta exactamente una vez.

use crate::error::HttpError;
use crate::pool::queue::TaskQueue;
use crate::sync::{CountingSemaphore, Semaphore};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Estado compartido entre el pool y sus workers
struct PoolShared {
    queue: TaskQueue,
    work_available: Semaphore,
    backlog_slots: Option<Semaphore>,
}

/// Pool de threads con backlog opcional
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
    backlog: usize,
}

impl WorkerPool {
    /// Detectar automáticamente el número de workers
    pub const AUTO_WORKERS: usize = 0;

    /// Backlog ilimitado: `submit` nunca bloquea
    pub const UNBOUNDED_BACKLOG: usize = 0;

    /// Crea el pool y lanza los workers
    ///
    /// # Argumentos
    ///
    /// * `workers` - Número de workers (`AUTO_WORKERS` = mitad del paralelismo
    ///   disponible, mínimo 1)
    /// * `backlog` - Máximo de tareas encoladas sin desencolar
    ///   (`UNBOUNDED_BACKLOG` = sin límite)
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::pool::WorkerPool;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let mut pool = WorkerPool::new(2, WorkerPool::UNBOUNDED_BACKLOG).unwrap();
    /// let counter = Arc::new(AtomicUsize::new(0));
    ///
    /// for _ in 0..10 {
    ///     let counter = Arc::clone(&counter);
    ///     pool.submit(move || {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///     }).unwrap();
    /// }
    ///
    /// pool.shutdown();
    /// pool.join_all();
    /// assert_eq!(counter.load(Ordering::SeqCst), 10);
    /// ```
    pub fn new(workers: usize, backlog: usize) -> Result<Self, HttpError> {
        let worker_count = if workers == Self::AUTO_WORKERS {
            auto_worker_count()
        } else {
            workers
        };

        let backlog_slots = if backlog == Self::UNBOUNDED_BACKLOG {
            None
        } else {
            Some(Semaphore::new(backlog))
        };

        let mut pool = Self {
            shared: Arc::new(PoolShared {
                queue: TaskQueue::new(),
                work_available: Semaphore::new(0),
                backlog_slots,
            }),
            workers: Vec::with_capacity(worker_count),
            worker_count: 0,
            backlog,
        };

        for id in 0..worker_count {
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("minihttpd-worker-{}", id))
                .spawn(move || Self::worker_loop(id, shared));

            match spawned {
                Ok(handle) => {
                    pool.workers.push(handle);
                    pool.worker_count += 1;
                }
                Err(e) => {
                    // Bajar los workers que sí arrancaron
                    pool.shutdown();
                    pool.join_all();
                    return Err(HttpError::WorkerSpawn(e));
                }
            }
        }

        info!(workers = worker_count, backlog, "Pool de workers iniciado");
        Ok(pool)
    }

    /// Encola una tarea
    ///
    /// Si hay límite de backlog y está lleno, bloquea hasta que un worker
    /// desencole algo. Falla con `HttpError::PoolClosed` después de
    /// `shutdown()`.
    pub fn submit<F>(&self, task: F) -> Result<(), HttpError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.queue.is_closed() {
            return Err(HttpError::PoolClosed);
        }

        if let Some(slots) = &self.shared.backlog_slots {
            slots.wait()?;
        }

        if let Err(e) = self.shared.queue.push(Box::new(task)) {
            // Devolver el slot reservado
            if let Some(slots) = &self.shared.backlog_slots {
                slots.post()?;
            }
            return Err(e);
        }

        self.shared.work_available.post()
    }

    /// Inicia el apagado: no se aceptan más tareas y cada worker termina
    /// después de vaciar la cola
    pub fn shutdown(&self) {
        if !self.shared.queue.close() {
            return;
        }

        debug!(workers = self.worker_count, "Enviando señales de shutdown");
        for _ in 0..self.worker_count {
            if let Err(e) = self.shared.work_available.post() {
                error!("No se pudo señalizar shutdown: {}", e);
            }
        }
    }

    /// Bloquea hasta que todos los workers terminen
    ///
    /// Solo retorna si antes se llamó a `shutdown()`.
    pub fn join_all(&mut self) {
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Un worker terminó con panic");
            }
        }
    }

    /// Número de workers del pool
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Límite del backlog (0 = ilimitado)
    pub fn backlog(&self) -> usize {
        self.backlog
    }

    /// Tareas encoladas que ningún worker tomó todavía
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Indica si ya se llamó a `shutdown()`
    pub fn is_closed(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Loop principal de cada worker
    fn worker_loop(id: usize, shared: Arc<PoolShared>) {
        debug!(worker = id, "Worker iniciado");

        loop {
            if let Err(e) = shared.work_available.wait() {
                error!(worker = id, "Worker abortado: {}", e);
                return;
            }

            // Cola vacía al despertar = señal de shutdown
            let Some(task) = shared.queue.pop() else {
                debug!(worker = id, "Worker terminado");
                return;
            };

            if let Some(slots) = &shared.backlog_slots {
                if let Err(e) = slots.post() {
                    error!(worker = id, "No se pudo liberar slot del backlog: {}", e);
                }
            }

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                error!(worker = id, "Tarea terminó con panic: {}", panic_message(&*payload));
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        self.join_all();
    }
}

/// Mitad del paralelismo disponible (núcleos físicos con hyperthreading),
/// mínimo 1
fn auto_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Extrae el mensaje de un panic capturado
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "panic sin mensaje"
    }
}
