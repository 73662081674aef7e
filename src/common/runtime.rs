use tokio::runtime::Runtime;

pub(crate) fn new(worker_threads: usize, blocking_threads: usize) -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(blocking_threads) // This is a maximum
        .thread_name("pathmock-worker")
        .enable_all()
        .build()
}
