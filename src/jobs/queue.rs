//! # Cola FIFO para Jobs
//! src/jobs/queue.rs
//!
//! Cola thread-safe, sin límite de capacidad, de múltiples productores y
//! múltiples consumidores. `enqueue` nunca bloquea; `dequeue` bloquea al
//! worker hasta que haya un elemento o la cola se cierre.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Error de `enqueue` sobre una cola cerrada; devuelve el elemento
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("job queue is closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Cola FIFO thread-safe
pub struct JobQueue<T> {
    /// Estado interno
    state: Arc<Mutex<QueueState<T>>>,

    /// Condvar para notificar cuando hay nuevos jobs (o al cerrar)
    condvar: Arc<Condvar>,
}

impl<T> JobQueue<T> {
    /// Crea una cola vacía
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            })),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un elemento al final
    ///
    /// Nunca bloquea. Sólo falla si la cola ya fue cerrada.
    pub fn enqueue(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.lock();

        if state.closed {
            return Err(QueueClosed(item));
        }

        state.items.push_back(item);

        // Notificar a un worker esperando
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea hasta que haya un elemento disponible. Retorna `None` sólo
    /// cuando la cola está cerrada y vacía.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }

            if state.closed {
                return None;
            }

            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Cierra la cola y despierta a todos los workers
    ///
    /// Los elementos ya encolados se siguen entregando.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
