//! The bounded worker pool behind `get` dispatch.
//!
//! `get` never blocks the evaluating thread: it enqueues a work item and
//! returns. A fixed set of worker threads drains the queue. The pool keeps a
//! count of outstanding items so `Interpreter::exec` can block after `init`
//! returns until every dispatched request, and every request those requests
//! dispatched in turn, has finished.
//!
//! A work item that fails is reported to stderr with a `worker:` prefix and
//! counts as done; it never takes down other workers or the interpreter. A
//! panicking work item is caught and reported the same way, with its payload
//! included rather than swallowed.

use std::{
	panic::{AssertUnwindSafe, catch_unwind},
	sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, mpsc},
	thread::JoinHandle,
};

use crate::error::interpreter::RuntimeError;

/// A closed-over computation performing one HTTP request and dispatching
/// its continuation.
pub type Job = Box<dyn FnOnce() -> Result<(), RuntimeError> + Send>;

pub struct Pool {
	sender:  Mutex<Option<mpsc::Sender<Job>>>,
	workers: Vec<JoinHandle<()>>,
	pending: Arc<Pending>,
}

impl Pool {
	/// Starts `size` worker threads sharing one job queue.
	pub fn new(size: usize) -> Self {
		let (sender, receiver) = mpsc::channel::<Job>();
		let receiver = Arc::new(Mutex::new(receiver));
		let pending = Arc::new(Pending::default());

		let workers = (0..size)
			.map(|_| {
				let receiver = receiver.clone();
				let pending = pending.clone();
				std::thread::spawn(move || worker_loop(receiver, pending))
			})
			.collect();

		Self { sender: Mutex::new(Some(sender)), workers, pending }
	}

	/// Enqueues a work item. The outstanding count is raised before the job
	/// is handed over so `wait` cannot observe a gap between a submitting
	/// job finishing and its submission starting.
	pub fn submit(&self, job: Job) -> Result<(), RuntimeError> {
		self.pending.add();

		let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
		let alive = match sender.as_ref() {
			Some(sender) => sender.send(job).is_ok(),
			None => false,
		};
		if !alive {
			self.pending.finish();
			return Err(RuntimeError::Submit("worker pool is shut down"));
		}
		Ok(())
	}

	/// Blocks until every submitted work item has completed.
	pub fn wait(&self) { self.pending.wait(); }
}

impl Drop for Pool {
	fn drop(&mut self) {
		// Closing the channel ends the worker loops.
		self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
		for worker in self.workers.drain(..) {
			let _ = worker.join();
		}
	}
}

fn worker_loop(receiver: Arc<Mutex<mpsc::Receiver<Job>>>, pending: Arc<Pending>) {
	loop {
		let job = receiver.lock().unwrap_or_else(PoisonError::into_inner).recv();
		let Ok(job) = job else { break };

		match catch_unwind(AssertUnwindSafe(job)) {
			Ok(Ok(())) => {}
			Ok(Err(err)) => eprintln!("worker: {err}"),
			Err(panic) => eprintln!("worker: panicked: {}", panic_message(panic.as_ref())),
		}
		pending.finish();
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message
	} else {
		"unknown panic payload"
	}
}

/// Counter of outstanding work items with a condition to wait for drain.
#[derive(Default)]
struct Pending {
	count:   Mutex<usize>,
	drained: Condvar,
}

impl Pending {
	fn add(&self) { *self.lock() += 1; }

	fn finish(&self) {
		let mut count = self.lock();
		*count -= 1;
		if *count == 0 {
			self.drained.notify_all();
		}
	}

	fn wait(&self) {
		let mut count = self.lock();
		while *count > 0 {
			count = self.drained.wait(count).unwrap_or_else(PoisonError::into_inner);
		}
	}

	fn lock(&self) -> MutexGuard<'_, usize> { self.count.lock().unwrap_or_else(PoisonError::into_inner) }
}
