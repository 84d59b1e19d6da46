//! # Workload
//! src/jobs/workload.rs
//!
//! Interfaz de un solo método para el trabajo que ejecutan los workers.
//! El motor recibe el workload por composición (`JobEngine<W>`), no lo
//! hereda.

use std::fmt;
use std::marker::PhantomData;

/// Trabajo inyectable que procesa un payload
///
/// Debe ser una función pura del payload: retorna un valor o un error, y
/// eventualmente termina. Un error se guarda como resultado terminal del
/// job usando su `Display`.
pub trait Workload: Send + Sync + 'static {
    type Payload: Clone + Send + 'static;
    type Output: Clone + Send + 'static;
    type Error: fmt::Display;

    fn run(&self, payload: Self::Payload) -> Result<Self::Output, Self::Error>;
}

/// Adapta un closure `Fn(P) -> Result<O, E>` a `Workload`
pub struct FnWorkload<F, P, O, E> {
    f: F,
    _marker: PhantomData<fn(P) -> Result<O, E>>,
}

impl<F, P, O, E> FnWorkload<F, P, O, E>
where
    F: Fn(P) -> Result<O, E>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, P, O, E> Workload for FnWorkload<F, P, O, E>
where
    F: Fn(P) -> Result<O, E> + Send + Sync + 'static,
    P: Clone + Send + 'static,
    O: Clone + Send + 'static,
    E: fmt::Display + 'static,
{
    type Payload = P;
    type Output = O;
    type Error = E;

    fn run(&self, payload: P) -> Result<O, E> {
        (self.f)(payload)
    }
}
