use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, warn, LevelFilter};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// Sets up env_logger behind the indicatif bridge. Calling it a second time only logs a warning,
/// which keeps tests that initialize logging independent of each other.
pub fn initialize_logging(log_level: LevelFilter) {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();

    let multi = MULTI.get_or_init(MultiProgress::new).clone();

    if LogWrapper::new(multi, logger).try_init().is_err() {
        warn!(target: "logging", "Logging was already initialized");
    }
}

/// Progress bars are only attached to the shared `MultiProgress` if logging went through
/// `initialize_logging`. Otherwise they are drawn on their own (or hidden, without a terminal).
fn attach(pb: &ProgressBar) {
    if let Some(multi) = MULTI.get() {
        multi.add(pb.clone());
    }
}

fn detach(pb: &ProgressBar) {
    if let Some(multi) = MULTI.get() {
        multi.remove(pb);
    }
}

fn elapsed_since(start_time: SystemTime) -> indicatif::HumanDuration {
    indicatif::HumanDuration(start_time.elapsed().unwrap_or_default())
}

pub fn run_with_spinner<'a, F, Out>(
    target: &'a str, task_desc: &'a str, function: F,
) -> Out where
    F: FnOnce() -> Out,
{
    let start_time = SystemTime::now();

    let pb = ProgressBar::new_spinner()
        .with_message(format!("{}...", task_desc))
        .with_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(100));

    // Set up connection with log library so that progress bars don't jump around
    attach(&pb);

    let out = function();

    pb.finish_and_clear();
    detach(&pb);
    info!(target: target, "{} finished (took {})", task_desc, elapsed_since(start_time));

    out
}

pub fn run_with_pb<'a, F, Out>(
    target: &'a str, task_desc: &'a str, total: u64, print_message: bool, function: F,
) -> Out where
    F: FnOnce(ProgressBar) -> Out,
{
    let start_time = SystemTime::now();

    let pb = ProgressBar::new(total)
        .with_message(format!("{}...", task_desc))
        .with_style(bar_style());
    pb.enable_steady_tick(Duration::from_secs(1));

    attach(&pb);

    let out = function(pb.clone());

    pb.finish_and_clear();
    detach(&pb);
    if print_message {
        info!(target: target, "{} finished (took {})", task_desc, elapsed_since(start_time));
    }

    out
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.white} [{elapsed:.green}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed:.green}] {msg} [{wide_bar:.cyan/blue}] {human_pos}/{human_len} [{eta}]")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
