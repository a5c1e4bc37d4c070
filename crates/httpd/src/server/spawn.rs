use std::fmt;
use std::io;
use std::thread;

/// Work handed to a [`Spawn`] implementation, usually one connection.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks concurrently with the accept loop.
///
/// The server does not care how: a thread per task, a pool, or a runtime's
/// blocking executor all work. An `Err` means the task could not be started
/// and was dropped.
pub trait Spawn: Send + Sync {
    fn spawn(&self, task: Task) -> io::Result<()>;
}

impl<S: Spawn + ?Sized> Spawn for Box<S> {
    fn spawn(&self, task: Task) -> io::Result<()> {
        (**self).spawn(task)
    }
}

impl<S: Spawn + ?Sized> Spawn for std::sync::Arc<S> {
    fn spawn(&self, task: Task) -> io::Result<()> {
        (**self).spawn(task)
    }
}

/// A [`Spawn`] built from a closure, see [`spawn_fn`].
pub struct SpawnFn<F>(F);

impl<F> fmt::Debug for SpawnFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnFn").finish_non_exhaustive()
    }
}

impl<F> Spawn for SpawnFn<F>
where
    F: Fn(Task) -> io::Result<()> + Send + Sync,
{
    fn spawn(&self, task: Task) -> io::Result<()> {
        (self.0)(task)
    }
}

/// Wraps a closure as a [`Spawn`].
///
/// ```
/// use micro_httpd::server::{spawn_fn, Spawn};
///
/// // runs every task on the calling thread
/// let inline = spawn_fn(|task| {
///     task();
///     Ok(())
/// });
/// inline.spawn(Box::new(|| println!("done"))).unwrap();
/// ```
pub fn spawn_fn<F>(f: F) -> SpawnFn<F>
where
    F: Fn(Task) -> io::Result<()> + Send + Sync,
{
    SpawnFn(f)
}

/// Starts one named OS thread per task.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name: String,
    stack_size: Option<usize>,
}

impl ThreadSpawner {
    pub fn new() -> Self {
        Self { name: "micro-httpd-conn".to_owned(), stack_size: None }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawn for ThreadSpawner {
    fn spawn(&self, task: Task) -> io::Result<()> {
        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(task).map(drop)
    }
}

/// Runs each connection on the runtime's blocking pool.
#[cfg(feature = "tokio")]
impl Spawn for tokio::runtime::Handle {
    fn spawn(&self, task: Task) -> io::Result<()> {
        drop(self.spawn_blocking(task));
        Ok(())
    }
}
