//! # Pool de Workers
//! src/pool/mod.rs
//!
//! Número fijo de threads de larga vida que consumen de una `TaskQueue`
//! compartida.
//!
//! ## Ciclo de vida
//!
//! ```text
//! new(n) ──► workers esperando en la cola
//! submit(task) ──► cola (FIFO) ──► un worker libre la ejecuta
//! shutdown() ──► cola cerrada ──► workers vacían la cola ──► join
//! ```
//!
//! Después de `shutdown()` las tareas ya encoladas se ejecutan igual; solo
//! se rechazan las nuevas.

pub mod queue;

pub use queue::TaskQueue;

use crate::error::PoolError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Unidad de trabajo: una closure sin argumentos que posee todo lo que usa
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Estado compartido entre el pool y sus workers
struct Shared {
    queue: TaskQueue<Task>,

    /// Tareas que terminaron en panic
    panicked: AtomicUsize,
}

/// Pool de threads de tamaño fijo
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

/// Tamaño efectivo del pool
///
/// 0 o más threads que el paralelismo disponible ⇒ paralelismo disponible.
pub fn effective_size(requested: usize) -> usize {
    let available = thread::available_parallelism().map_or(1, |n| n.get());

    if requested == 0 || requested > available {
        available
    } else {
        requested
    }
}

impl ThreadPool {
    /// Inicia `size` workers (ajustado con `effective_size`) sobre una cola
    /// sin límite
    pub fn new(size: usize) -> Result<Self, PoolError> {
        Self::with_capacity(size, None)
    }

    /// Igual que `new` pero con una cola de capacidad máxima
    pub fn with_capacity(size: usize, capacity: Option<usize>) -> Result<Self, PoolError> {
        let size = effective_size(size);
        let shared = Arc::new(Shared {
            queue: TaskQueue::new(capacity),
            panicked: AtomicUsize::new(0),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size),
            size,
        };

        for id in 0..size {
            let shared = Arc::clone(&pool.shared);
            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || Self::worker_loop(id, shared));

            match handle {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // `pool` se destruye aquí y apaga los workers ya creados
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        debug!(workers = size, capacity = ?capacity, "thread pool started");
        Ok(pool)
    }

    /// Loop principal del worker
    fn worker_loop(id: usize, shared: Arc<Shared>) {
        debug!(worker = id, "worker started");

        while let Some(task) = shared.queue.pop() {
            // Un panic dentro de la tarea no debe matar al worker
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                shared.panicked.fetch_add(1, Ordering::Relaxed);
                error!(worker = id, "task panicked");
            }
        }

        debug!(worker = id, "worker exiting");
    }

    /// Encola una tarea
    ///
    /// Si el pool está apagándose (o la cola está llena) la tarea se
    /// descarta sin ejecutarse y todo lo que capturaba se libera.
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.queue.push(Box::new(task))
    }

    /// Cierra la cola, deja que los workers terminen lo encolado y los une
    ///
    /// Idempotente: la segunda llamada no hace nada.
    pub fn shutdown(&mut self) {
        self.shared.queue.close();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked outside a task");
            }
        }
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tareas encoladas que ningún worker tomó todavía
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Tareas que terminaron en panic
    pub fn panicked(&self) -> usize {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Workers que todavía no se unieron
    pub fn live_workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
