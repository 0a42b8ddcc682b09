//! # Cola de tareas
//! src/pool/queue.rs
//!
//! Cola FIFO thread-safe compartida por todos los workers. La cola y el flag
//! de apagado viven bajo el mismo `Mutex`, así un worker nunca puede ver
//! "cola vacía" y "no apagado" y luego perderse la notificación de cierre.

use crate::error::PoolError;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Estado protegido por el mutex
struct State<T> {
    tasks: VecDeque<T>,

    /// Pasa de false a true una sola vez
    closed: bool,
}

/// Cola FIFO con cierre y capacidad opcional
pub struct TaskQueue<T> {
    state: Mutex<State<T>>,

    /// Condvar para despertar workers cuando hay tareas o se cierra la cola
    available: Condvar,

    /// `None` = sin límite
    capacity: Option<usize>,
}

impl<T> TaskQueue<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Ninguna tarea se ejecuta con el lock tomado, así que un mutex
    /// envenenado no deja la cola en un estado inconsistente
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola al final y despierta a un worker
    ///
    /// Falla si la cola está cerrada o llena; en ese caso la tarea se
    /// descarta (drop) dentro de esta llamada.
    pub fn push(&self, task: T) -> Result<(), PoolError> {
        {
            let mut state = self.lock();

            if state.closed {
                return Err(PoolError::ShutDown);
            }
            if let Some(capacity) = self.capacity {
                if state.tasks.len() >= capacity {
                    return Err(PoolError::QueueFull(capacity));
                }
            }

            state.tasks.push_back(task);
        }

        self.available.notify_one();
        Ok(())
    }

    /// Saca la tarea más antigua, bloqueando hasta que haya una
    ///
    /// Retorna `None` solo cuando la cola está cerrada y vacía: las tareas
    /// que quedaban al cerrar se siguen entregando.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.closed {
                return None;
            }

            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los workers
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new(None);
        for i in 0..5 {
            queue.push(i).unwrap();
        }

        let out: Vec<i32> = (0..5).filter_map(|_| queue.pop()).collect();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_capacity() {
        let queue = TaskQueue::new(Some(2));
        assert!(queue.push(1).is_ok());
        assert!(queue.push(2).is_ok());
        assert!(matches!(queue.push(3), Err(PoolError::QueueFull(2)))); // Cola llena

        queue.pop();
        assert!(queue.push(3).is_ok());
    }

    #[test]
    fn test_push_after_close() {
        let queue = TaskQueue::new(None);
        queue.close();
        assert!(queue.is_closed());
        assert!(matches!(queue.push(1), Err(PoolError::ShutDown)));
    }

    #[test]
    fn test_close_drains_remaining() {
        let queue = TaskQueue::new(None);
        queue.push("a").unwrap();
        queue.push("b").unwrap();
        queue.close();

        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_close_wakes_blocked_pop() {
        let queue = Arc::new(TaskQueue::<u32>::new(None));

        let waiter = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.pop()
        });

        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn test_push_wakes_blocked_pop() {
        let queue = Arc::new(TaskQueue::new(None));

        let waiter = thread::spawn({
            let queue = Arc::clone(&queue);
            move || queue.pop()
        });

        thread::sleep(Duration::from_millis(50));
        queue.push(7).unwrap();

        assert_eq!(waiter.join().unwrap(), Some(7));
    }
}
