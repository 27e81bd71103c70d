use polars::prelude::*;
use serde::Deserialize;

use crate::error::SummaryError;

/// What an output column holds, which decides how it is rounded and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Grouping keys and labels, passed through untouched.
    Label,
    /// Dollar amounts: rounded, then rendered with fixed decimal padding.
    Monetary,
    /// Shares of a total in `[0, 1]`.
    Percentage,
    /// Durations in years.
    Years,
    /// Averages.
    Mean,
    /// Row counts.
    Count,
}

/// One column of a summary output schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: String,
    pub role: ColumnRole,
}

impl OutputColumn {
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Decimal places per column role, plus the step used by [`fancy_number`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Precision {
    pub total: u32,
    pub percentage: u32,
    pub years: u32,
    pub mean: u32,
    pub fancy_accuracy: f64,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            total: 2,
            percentage: 4,
            years: 2,
            mean: 2,
            fancy_accuracy: 0.1,
        }
    }
}

impl Precision {
    pub fn decimals_for(&self, role: ColumnRole) -> Option<u32> {
        match role {
            ColumnRole::Monetary => Some(self.total),
            ColumnRole::Percentage => Some(self.percentage),
            ColumnRole::Years => Some(self.years),
            ColumnRole::Mean => Some(self.mean),
            ColumnRole::Label | ColumnRole::Count => None,
        }
    }
}

/// Round to `decimals` places, ties to even, on the scaled value.
///
/// `2.005` scales to `200.49999999999997` and so rounds down to `2.0`,
/// matching numpy/pandas output for published figures.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    // Avoid rendering "-0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round and render with fixed padding: `5` -> `"5.00"`.
pub fn format_fixed(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, round_half_even(value, decimals))
}

/// Monetary rounding at the default two places.
pub fn round_total(value: f64) -> String {
    format_fixed(value, Precision::default().total)
}

const FANCY_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Human-readable magnitude, e.g. `1_234_567` with accuracy `0.1` -> `"1.2M"`.
///
/// The value is scaled by 1000 per suffix step and rounded (ties to even) to a
/// multiple of `accuracy`. Decimals shown are those implied by `accuracy`.
pub fn fancy_number(value: f64, accuracy: f64) -> String {
    let decimals = decimals_for_step(accuracy);
    let last = FANCY_SUFFIXES.len() - 1;

    let mut magnitude = value.abs();
    let mut suffix = 0;
    while magnitude >= 1000.0 && suffix < last {
        magnitude /= 1000.0;
        suffix += 1;
    }
    let mut rounded = round_to_step(magnitude, accuracy);
    if rounded >= 1000.0 && suffix < last {
        magnitude /= 1000.0;
        suffix += 1;
        rounded = round_to_step(magnitude, accuracy);
    }

    let sign = if value < 0.0 && rounded != 0.0 { "-" } else { "" };
    format!(
        "{sign}{rounded:.prec$}{}",
        FANCY_SUFFIXES[suffix],
        prec = decimals
    )
}

fn round_to_step(value: f64, step: f64) -> f64 {
    (value / step).round_ties_even() * step
}

fn decimals_for_step(step: f64) -> usize {
    let mut scaled = step;
    let mut decimals = 0;
    while decimals < 6 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

/// Round every numeric column in place according to its role.
pub fn round_columns(
    df: &mut DataFrame,
    columns: &[OutputColumn],
    precision: &Precision,
) -> Result<(), SummaryError> {
    for column in columns {
        let Some(decimals) = precision.decimals_for(column.role) else {
            continue;
        };
        let values = df.column(&column.name)?.cast(&DataType::Float64)?;
        let rounded: Float64Chunked = values
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| round_half_even(x, decimals)))
            .collect();
        df.with_column(rounded.with_name(column.name.as_str().into()).into_series())?;
    }
    Ok(())
}

/// Replace monetary columns with fixed-decimal strings for CSV output.
pub fn render_monetary(
    df: &mut DataFrame,
    columns: &[OutputColumn],
    precision: &Precision,
) -> Result<(), SummaryError> {
    for column in columns.iter().filter(|c| c.role == ColumnRole::Monetary) {
        let values = df.column(&column.name)?.cast(&DataType::Float64)?;
        let rendered: StringChunked = values
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| format_fixed(x, precision.total)))
            .collect();
        df.with_column(rendered.with_name(column.name.as_str().into()).into_series())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_padded() {
        assert_eq!(round_total(5.0), "5.00");
        assert_eq!(round_total(1234.5), "1234.50");
        assert_eq!(round_total(-0.001), "0.00");
    }

    #[test]
    fn rounding_is_half_even_on_the_scaled_value() {
        // 2.005 is stored just below the midpoint.
        assert_eq!(round_total(2.005), "2.00");
        // Exact midpoints go to the even neighbour.
        assert_eq!(format_fixed(0.125, 2), "0.12");
        assert_eq!(format_fixed(0.375, 2), "0.38");
        assert_eq!(round_half_even(0.33333333, 4), 0.3333);
    }

    #[test]
    fn roles_map_to_configured_precision() {
        let precision = Precision::default();
        assert_eq!(precision.decimals_for(ColumnRole::Monetary), Some(2));
        assert_eq!(precision.decimals_for(ColumnRole::Percentage), Some(4));
        assert_eq!(precision.decimals_for(ColumnRole::Years), Some(2));
        assert_eq!(precision.decimals_for(ColumnRole::Mean), Some(2));
        assert_eq!(precision.decimals_for(ColumnRole::Label), None);
        assert_eq!(precision.decimals_for(ColumnRole::Count), None);
    }

    #[test]
    fn fancy_abbreviates_magnitudes() {
        assert_eq!(fancy_number(5.0, 1.0), "5");
        assert_eq!(fancy_number(1_234_567.0, 0.1), "1.2M");
        assert_eq!(fancy_number(-2_500_000.0, 0.1), "-2.5M");
        assert_eq!(fancy_number(3_400_000_000.0, 0.1), "3.4B");
        assert_eq!(fancy_number(999_999.0, 0.1), "1.0M");
        assert_eq!(fancy_number(12_000.0, 1.0), "12K");
    }

    #[test]
    fn frame_columns_are_rounded_and_rendered_by_role() {
        let mut df = DataFrame::new(vec![
            Column::new("vendor".into(), &["A", "B"]),
            Column::new("total".into(), &[5.0, 2.005]),
            Column::new("percentage".into(), &[0.714285714, 0.285714286]),
        ])
        .unwrap();
        let columns = vec![
            OutputColumn::new("vendor", ColumnRole::Label),
            OutputColumn::new("total", ColumnRole::Monetary),
            OutputColumn::new("percentage", ColumnRole::Percentage),
        ];
        let precision = Precision::default();

        round_columns(&mut df, &columns, &precision).unwrap();
        let pct: Vec<Option<f64>> = df
            .column("percentage")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(pct, vec![Some(0.7143), Some(0.2857)]);

        render_monetary(&mut df, &columns, &precision).unwrap();
        let totals: Vec<Option<&str>> = df
            .column("total")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(totals, vec![Some("5.00"), Some("2.00")]);
    }
}
