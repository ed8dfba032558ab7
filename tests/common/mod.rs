//! Shared fixtures for integration tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use churn_service::preprocessing::CHURN_FEATURES;

const RAW_HEADER: [&str; 21] = [
    "state",
    "account length",
    "area code",
    "phone number",
    "international plan",
    "voice mail plan",
    "number vmail messages",
    "total day minutes",
    "total day calls",
    "total day charge",
    "total eve minutes",
    "total eve calls",
    "total eve charge",
    "total night minutes",
    "total night calls",
    "total night charge",
    "total intl minutes",
    "total intl calls",
    "total intl charge",
    "customer service calls",
    "churn",
];

/// Labeled raw customer table; every sixth customer churns and churners are
/// separable by day minutes and service calls.
pub fn raw_churn_csv(n: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = RAW_HEADER.join(",");
    out.push('\n');

    for i in 0..n {
        let churn = i % 6 == 0;
        let day_minutes = if churn { rng.gen_range(260.0..340.0) } else { rng.gen_range(90.0..230.0) };
        let service_calls = if churn { rng.gen_range(4..9) } else { rng.gen_range(0..3) };
        let intl_plan = if churn || i % 11 == 1 { "yes" } else { "no" };
        let vmail_plan = if i % 3 == 0 { "yes" } else { "no" };
        let night_minutes: f64 = rng.gen_range(100.0..300.0);
        let intl_minutes: f64 = rng.gen_range(2.0..18.0);
        let eve_minutes: f64 = rng.gen_range(100.0..300.0);

        let _ = writeln!(
            out,
            "{},{},{},{}-{:04},{},{},{},{:.1},{},{:.2},{:.1},{},{:.2},{:.1},{},{:.2},{:.1},{},{:.2},{},{}",
            ["KS", "OH", "NJ", "TX"][i % 4],
            rng.gen_range(1..220),
            [408, 415, 510][i % 3],
            382 + i % 7,
            i,
            intl_plan,
            vmail_plan,
            if vmail_plan == "yes" { rng.gen_range(10..40) } else { 0 },
            day_minutes,
            rng.gen_range(60..140),
            day_minutes * 0.17,
            eve_minutes,
            rng.gen_range(60..140),
            eve_minutes * 0.085,
            night_minutes,
            rng.gen_range(60..140),
            night_minutes * 0.045,
            intl_minutes,
            rng.gen_range(1..10),
            intl_minutes * 0.27,
            service_calls,
            if churn { "True" } else { "False" },
        );
    }
    out
}

/// Write the labeled table under `dir` and return its path
pub fn write_training_csv(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("custChurn.csv");
    std::fs::write(&path, raw_churn_csv(n, 11)).expect("write training csv");
    path
}

/// Inference-shaped rows (schema column names, one-hot already applied)
pub fn feature_csv(rows: &[(f64, i64, bool)]) -> String {
    let mut out = CHURN_FEATURES.join(",");
    out.push('\n');
    for (day_minutes, service_calls, intl_plan) in rows {
        let values: Vec<String> = CHURN_FEATURES
            .iter()
            .map(|name| match *name {
                "total day minutes" => format!("{:.1}", day_minutes),
                "total day charge" => format!("{:.2}", day_minutes * 0.17),
                "customer service calls" => service_calls.to_string(),
                "international plan_yes" => (*intl_plan as i64).to_string(),
                "account length" => "110".to_string(),
                "area code" => "415".to_string(),
                "number vmail messages" => "8".to_string(),
                "total eve minutes" | "total night minutes" => "200.0".to_string(),
                "total eve charge" => "17.00".to_string(),
                "total intl minutes" => "10.0".to_string(),
                "total intl calls" => "5".to_string(),
                _ => "100".to_string(),
            })
            .collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}
