use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;

pub fn run_in_pool<T, F>(cores: Option<usize>, context: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    match cores {
        Some(cores) => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(cores)
                .build()
                .context(context)?;
            Ok(pool.install(f))
        }
        None => Ok(f()),
    }
}

pub fn resolve_threads(cores: Option<usize>, replicates: usize) -> Option<usize> {
    cores.map(|cores| {
        let capped = cores.min(replicates.max(1));
        if cores > capped {
            tracing::warn!(
                "Requested {cores} threads for {replicates} replicates; using {capped}"
            );
        }
        capped
    })
}

pub fn collect_results<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    results.into_iter().collect()
}
