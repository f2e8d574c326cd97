use crate::common::*;

#[doc = "Function responsible for logging"]
/// # Arguments
/// * level - flexi_logger spec string (`info`, `debug`, `index_migrator=trace` ...)
///
/// # Returns
/// * Result<LoggerHandle, anyhow::Error> - the handle must stay alive for the whole run
pub fn set_global_logger(level: &str) -> Result<LoggerHandle, anyhow::Error> {
    let log_directory = "logs"; /* Directory to store log files */
    let file_prefix = "index_migrator"; /* Prefixes for log files */

    /* Logger setting */
    Logger::try_with_str(level)
        .with_context(|| format!("[set_global_logger] Invalid log level '{}'", level))?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory)
                .discriminant(file_prefix),
        )
        .rotate(
            Criterion::Age(Age::Day),  /* daily rotation */
            Naming::Timestamps,        /* Use timestamps for file names */
            Cleanup::KeepLogFiles(10), /* Maintain up to 10 log files */
        )
        .duplicate_to_stderr(Duplicate::Warn) /* warnings also reach the terminal */
        .format_for_files(custom_format)
        .start()
        .context("[set_global_logger] Logger initialization failed")
}

#[doc = "Custom Log Format Function"]
fn custom_format(
    w: &mut dyn Write,
    now: &mut flexi_logger::DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "[{}] [{}] T[{}] {}",
        now.now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        std::thread::current().name().unwrap_or("unknown"),
        &record.args()
    )
}
