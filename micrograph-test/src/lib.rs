//! Fixtures shared by the tests and benches of the micrograph crates.

#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate lazy_static;

mod film;
mod transport;

pub use film::*;
pub use transport::MockTransport;

use parking_lot::Mutex;
use std::sync::Arc;

pub type SyncCounter = Arc<Mutex<Counter>>;

#[derive(Debug, Default)]
pub struct Counter {
    n: u32
}

impl Counter {
    pub fn new() -> Self {
        Counter { n: 0 }
    }

    pub fn sync() -> SyncCounter {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn inc(&mut self) {
        self.n += 1;
    }

    pub fn get(&self) -> u32 {
        self.n
    }

    pub fn inc_sync(counter: &SyncCounter) {
        counter.lock().inc();
    }

    pub fn get_sync(counter: &SyncCounter) -> u32 {
        counter.lock().get()
    }
}

impl PartialEq<u32> for Counter {
    fn eq(&self, other: &u32) -> bool {
        &self.n == other
    }
}
