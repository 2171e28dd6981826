//! # Semáforo Contador
//! src/sync/semaphore.rs
//!
//! Semáforo clásico (post/wait) construido sobre `Mutex` + `Condvar`.
//! El contador se modifica siempre bajo el mutex, así que un `post` nunca se
//! pierde aunque ocurra antes de que el otro thread llegue a `wait`.
//!
//! El handle es de dueño único: `take()` mueve el estado interno a un handle
//! nuevo y deja el original invalidado. Cualquier operación sobre un handle
//! invalidado retorna `HttpError::SemaphoreInvalidated`.

use crate::error::HttpError;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Interfaz de un semáforo contador
///
/// El pool de workers solo depende de esta interfaz, no del mecanismo
/// concreto que la implementa.
pub trait CountingSemaphore {
    /// Incrementa el contador y despierta a un thread en espera
    fn post(&self) -> Result<(), HttpError>;

    /// Bloquea hasta que el contador sea > 0 y lo decrementa
    fn wait(&self) -> Result<(), HttpError>;

    /// Como `wait` pero sin bloquear. Retorna `true` si decrementó
    fn try_wait(&self) -> Result<bool, HttpError>;

    /// Como `wait` pero bloquea como máximo `timeout`
    fn timed_wait(&self, timeout: Duration) -> Result<bool, HttpError>;

    /// Valor actual del contador (puede estar desactualizado al retornar)
    fn value(&self) -> Result<usize, HttpError>;
}

/// Estado compartido del semáforo
#[derive(Debug)]
struct SemState {
    count: Mutex<usize>,
    available: Condvar,
}

impl SemState {
    fn lock(&self) -> MutexGuard<'_, usize> {
        // Un panic mientras se tenía el lock no deja el contador inconsistente
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Semáforo contador thread-safe
#[derive(Debug)]
pub struct Semaphore {
    state: Option<Box<SemState>>,
}

impl Semaphore {
    /// Crea un semáforo con el valor inicial indicado
    pub fn new(initial: usize) -> Self {
        Self {
            state: Some(Box::new(SemState {
                count: Mutex::new(initial),
                available: Condvar::new(),
            })),
        }
    }

    /// Mueve el estado a un handle nuevo. `self` queda invalidado.
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::sync::{CountingSemaphore, Semaphore};
    ///
    /// let mut original = Semaphore::new(2);
    /// let moved = original.take();
    ///
    /// assert_eq!(moved.value().unwrap(), 2);
    /// assert!(original.post().is_err());
    /// ```
    pub fn take(&mut self) -> Semaphore {
        Semaphore {
            state: self.state.take(),
        }
    }

    /// Indica si el handle sigue siendo utilizable
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> Result<&SemState, HttpError> {
        self.state.as_deref().ok_or(HttpError::SemaphoreInvalidated)
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CountingSemaphore for Semaphore {
    fn post(&self) -> Result<(), HttpError> {
        let state = self.state()?;
        let mut count = state.lock();
        *count += 1;
        state.available.notify_one();
        Ok(())
    }

    fn wait(&self) -> Result<(), HttpError> {
        let state = self.state()?;
        let mut count = state
            .available
            .wait_while(state.lock(), |count| *count == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        Ok(())
    }

    fn try_wait(&self) -> Result<bool, HttpError> {
        let state = self.state()?;
        let mut count = state.lock();
        if *count == 0 {
            return Ok(false);
        }
        *count -= 1;
        Ok(true)
    }

    fn timed_wait(&self, timeout: Duration) -> Result<bool, HttpError> {
        let state = self.state()?;
        let (mut count, result) = state
            .available
            .wait_timeout_while(state.lock(), timeout, |count| *count == 0)
            .unwrap_or_else(PoisonError::into_inner);

        if result.timed_out() && *count == 0 {
            return Ok(false);
        }
        *count -= 1;
        Ok(true)
    }

    fn value(&self) -> Result<usize, HttpError> {
        Ok(*self.state()?.lock())
    }
}
