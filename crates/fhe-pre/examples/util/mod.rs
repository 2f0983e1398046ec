#![allow(dead_code)]

//! Utility functions for the examples

use console::style;
use fhe_pre::CryptoContext;
use std::{fmt, time::Duration};
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

/// Installs a tracing subscriber; the events of the library are shown with
/// `RUST_LOG=fhe_pre=debug`.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fhe_pre=warn"));
    subscriber_fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints the parameters of a context.
pub fn print_context(cc: &CryptoContext) {
    println!("{}", style("CryptoContext generated.").green().bold());
    println!("  • scheme: {:?}", cc.scheme());
    println!("  • ring dimension: {}", cc.degree());
    if let Some(t) = cc.plaintext_modulus() {
        println!("  • plaintext modulus: {t}");
    }
    println!(
        "  • moduli sizes: {:?} + {} bits",
        cc.moduli_sizes(),
        64 - cc.special_modulus().leading_zeros()
    );
    println!("  • multiplicative depth: {}", cc.multiplicative_depth());
    println!("  • batch size: {}", cc.batch_size());
}

/// Macros to time code and display a human-readable duration.
pub mod timeit {
    #[allow(unused_macros)]
    macro_rules! timeit_n {
        ($name:expr, $loops:expr, $code:expr) => {{
            use util::DisplayDuration;
            let start = std::time::Instant::now();
            let r = $code;
            for _ in 1..$loops {
                let _ = $code;
            }
            println!(
                "⏱  {}: {}",
                $name,
                DisplayDuration(start.elapsed() / $loops)
            );
            r
        }};
    }

    #[allow(unused_macros)]
    macro_rules! timeit {
        ($name:expr, $code:expr) => {{
            use util::DisplayDuration;
            let start = std::time::Instant::now();
            let r = $code;
            println!("⏱  {}: {}", $name, DisplayDuration(start.elapsed()));
            r
        }};
    }

    #[allow(unused_imports)]
    pub(crate) use timeit;
    #[allow(unused_imports)]
    pub(crate) use timeit_n;
}

/// Utility struct for displaying human-readable duration of the form "10.5 ms",
/// "350 μs", or "27 ns".
pub struct DisplayDuration(pub Duration);

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration_ns = self.0.as_nanos();
        if duration_ns < 1_000_u128 {
            write!(f, "{duration_ns} ns")
        } else if duration_ns < 1_000_000_u128 {
            write!(f, "{} μs", (duration_ns + 500) / 1_000)
        } else {
            let duration_ms_times_10 = (duration_ns + 50_000) / (100_000);
            write!(f, "{} ms", (duration_ms_times_10 as f64) / 10.0)
        }
    }
}
