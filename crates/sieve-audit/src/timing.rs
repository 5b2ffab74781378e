//! Elapsed-time instrumentation.
//!
//! [`measure`] wraps any future and [`measure_blocking`] any closure. Both
//! log `"<name> Elapsed time is <report>"` at info level and hand back the
//! wrapped output untouched, errors included.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use console::style;
use tracing::info;

const SECS_PER_DAY: u64 = 24 * 3600;

/// Human-readable elapsed wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedReport {
    elapsed: Duration,
}

impl ElapsedReport {
    /// Wrap a measured duration.
    #[must_use]
    pub fn new(elapsed: Duration) -> Self {
        Self { elapsed }
    }

    /// The measured duration.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Green rendering for terminals; plain when stderr is not a tty.
    #[must_use]
    pub fn styled(&self) -> String {
        style(self.to_string()).green().for_stderr().to_string()
    }
}

impl fmt::Display for ElapsedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_elapsed(self.elapsed))
    }
}

/// Format a duration as days, hours, minutes and fractional seconds,
/// followed by the total in seconds.
///
/// `format_elapsed(Duration::from_secs_f64(3723.5))` gives
/// `"0 day 1 hour 02 min 3.500 sec(3,723.500 sec)"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let whole = elapsed.as_secs();
    let total = elapsed.as_secs_f64();
    let days = whole / SECS_PER_DAY;
    let hours = (whole / 3600) % 24;
    let minutes = (whole / 60) % 60;
    let seconds = (whole % 60) as f64 + f64::from(elapsed.subsec_nanos()) / 1e9;

    format!(
        "{} day {} hour {:02} min {:.3} sec({} sec)",
        group_thousands(&days.to_string()),
        hours,
        minutes,
        seconds,
        group_decimal(total),
    )
}

/// `1234567.25` -> `"1,234,567.250"`.
fn group_decimal(value: f64) -> String {
    let fixed = format!("{:.3}", value);
    match fixed.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group_thousands(int), frac),
        None => group_thousands(&fixed),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Time a future, log the report, and return its output.
pub async fn measure<F, T>(name: &str, operation: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let output = operation.await;
    report(name, start.elapsed());
    output
}

/// Time a synchronous operation, log the report, and return its output.
pub fn measure_blocking<F, T>(name: &str, operation: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let output = operation();
    report(name, start.elapsed());
    output
}

fn report(name: &str, elapsed: Duration) {
    let report = ElapsedReport::new(elapsed);
    info!(
        operation = %name,
        elapsed_secs = elapsed.as_secs_f64(),
        "{} Elapsed time is {}",
        name,
        report.styled()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sub_minute() {
        assert_eq!(
            format_elapsed(Duration::from_millis(1500)),
            "0 day 0 hour 00 min 1.500 sec(1.500 sec)"
        );
    }

    #[test]
    fn test_format_hours_minutes() {
        assert_eq!(
            format_elapsed(Duration::from_secs_f64(3723.5)),
            "0 day 1 hour 02 min 3.500 sec(3,723.500 sec)"
        );
    }

    #[test]
    fn test_format_days_wrap_hours() {
        // 2 days, 3 hours, 4 minutes, 5 seconds
        let secs = 2 * SECS_PER_DAY + 3 * 3600 + 4 * 60 + 5;
        assert_eq!(
            format_elapsed(Duration::from_secs(secs)),
            "2 day 3 hour 04 min 5.000 sec(183,845.000 sec)"
        );
    }

    #[test]
    fn test_format_many_days_grouped() {
        let secs = 1234 * SECS_PER_DAY;
        let text = format_elapsed(Duration::from_secs(secs));
        assert!(text.starts_with("1,234 day 0 hour 00 min"));
        assert!(text.ends_with("(106,617,600.000 sec)"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_measure_blocking_passes_result_through() {
        let ok: Result<u32, String> = measure_blocking("ok", || Ok(7));
        assert_eq!(ok, Ok(7));

        let err: Result<u32, String> = measure_blocking("err", || Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_measure_passes_future_output_through() {
        let value = measure("double", async { 21 * 2 }).await;
        assert_eq!(value, 42);
    }
}
