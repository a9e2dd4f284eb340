use crate::accumulator::{Accumulator, ConfusionBucket};
use crate::rates::{RatePair, derive_rates};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Tsv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "tsv" => Ok(Self::Tsv),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Tsv => "tsv",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub parameter: String,
    #[serde(flatten)]
    pub counts: ConfusionBucket,
    #[serde(flatten)]
    pub rates: RatePair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub records: u64,
    pub parameters: usize,
    pub rejected_lines: usize,
}

/// Counts and rates for every parameter of a finished accumulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub parameters: Vec<ReportRow>,
    pub totals: Totals,
}

impl Report {
    pub fn build(acc: &Accumulator, rejected_lines: usize) -> Self {
        // Both maps are keyed and ordered by parameter.
        let parameters = derive_rates(acc)
            .into_iter()
            .zip(acc.iter())
            .map(|((parameter, rates), (_, bucket))| ReportRow {
                parameter,
                counts: *bucket,
                rates,
            })
            .collect();
        Self {
            parameters,
            totals: Totals {
                records: acc.record_count(),
                parameters: acc.len(),
                rejected_lines,
            },
        }
    }

    pub fn render(&self, format: OutputFormat, precision: usize, color: bool) -> String {
        match format {
            OutputFormat::Human => self.render_human(precision, color),
            OutputFormat::Json => self.render_json(),
            OutputFormat::Tsv => self.render_tsv(precision),
        }
    }

    pub fn render_json(&self) -> String {
        // Report only holds strings, integers and finite floats.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render_tsv(&self, precision: usize) -> String {
        let mut out = String::from("parameter\ttp\tfp\tfn\ttn\ttprate\tfprate");
        for row in &self.parameters {
            let c = &row.counts;
            out.push('\n');
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.parameter,
                c.true_positive,
                c.false_positive,
                c.false_negative,
                c.true_negative,
                format_rate(row.rates.tprate, precision),
                format_rate(row.rates.fprate, precision),
            ));
        }
        out
    }

    pub fn render_human(&self, precision: usize, color: bool) -> String {
        let heading = |s: &str| {
            if color {
                s.bold().cyan().to_string()
            } else {
                s.to_string()
            }
        };

        let mut out = heading("Parameters:");
        if self.parameters.is_empty() {
            out.push_str(" none");
        }
        for row in &self.parameters {
            let c = &row.counts;
            out.push_str("\n  ");
            out.push_str(&row.parameter);
            out.push(':');
            out.push_str(&format!(
                "\n    tp = {}  fp = {}  fn = {}  tn = {}",
                c.true_positive, c.false_positive, c.false_negative, c.true_negative
            ));
            out.push_str("\n    tprate = ");
            out.push_str(&colorize_rate(row.rates.tprate, precision, color));
            out.push_str("\n    fprate = ");
            out.push_str(&colorize_rate(row.rates.fprate, precision, color));
        }

        out.push('\n');
        out.push_str(&heading("Totals:"));
        out.push_str(&format!("\n  records = {}", self.totals.records));
        out.push_str(&format!("\n  parameters = {}", self.totals.parameters));
        let rejected = self.totals.rejected_lines.to_string();
        out.push_str("\n  rejected lines = ");
        if color && self.totals.rejected_lines > 0 {
            out.push_str(&rejected.yellow().to_string());
        } else {
            out.push_str(&rejected);
        }
        out
    }
}

/// Undefined rates print as `-`.
pub fn format_rate(rate: Option<f64>, precision: usize) -> String {
    match rate {
        Some(r) => format!("{:.*}", precision, r),
        None => "-".to_string(),
    }
}

fn colorize_rate(rate: Option<f64>, precision: usize, color: bool) -> String {
    let s = format_rate(rate, precision);
    if !color {
        return s;
    }
    match rate {
        Some(_) => s.green().to_string(),
        None => s.dimmed().to_string(),
    }
}
