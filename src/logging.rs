use polars::prelude::DataFrame;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_frame_shape(label: &str, df: &DataFrame) {
    debug!("{label}: {} rows x {} columns", df.height(), df.width());
}

pub fn log_matrix_shape(label: &str, shape: (usize, usize)) {
    debug!("{label}: {} variants x {} columns", shape.0, shape.1);
}
