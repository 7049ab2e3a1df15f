// Dispatch Infrastructure - In-memory adapters
// Implements: WorkQueue

pub mod memory_queue;

pub use memory_queue::InMemoryWorkQueue;
