use redcraft::core::tensor::OrderTensor;
use redcraft::engine::config::EvaluateRequest;
use redcraft::workflows::evaluate::Evaluation;
use std::io::{self, Write};

const UNAVAILABLE: &str = "NA";

/// Formats like a C stream in its default mode: six significant digits,
/// trailing zeros dropped, exponent form outside `[1e-4, 1e6)`.
pub fn general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let exponential = format!("{value:.5e}");
    let (mantissa, exp) = split_exponent(&exponential);
    if !(-4..6).contains(&exp) {
        return format!("{}e{}", trim_zeros(mantissa), c_exponent(exp));
    }
    let decimals = (5 - exp).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

/// Fixed-precision exponent form with a signed, two-digit exponent (`1.234e-04`).
pub fn scientific(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let formatted = format!("{value:.precision$e}");
    let (mantissa, exp) = split_exponent(&formatted);
    format!("{mantissa}e{}", c_exponent(exp))
}

fn split_exponent(formatted: &str) -> (&str, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn c_exponent(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{sign}{:02}", exp.abs())
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn write_tensor(out: &mut impl Write, tensor: &OrderTensor) -> io::Result<()> {
    let m = tensor.to_matrix3();
    for row in 0..3 {
        let cells: Vec<String> = (0..3)
            .map(|col| format!("{:>11}", scientific(m[(row, col)], 3)))
            .collect();
        writeln!(out, "{}", cells.join(" "))?;
    }
    Ok(())
}

/// Prints the reports `request` asked for. Energies come first, then the
/// evaluation line, tensors and distances.
pub fn write_report(
    out: &mut impl Write,
    evaluation: &Evaluation,
    request: &EvaluateRequest,
) -> io::Result<()> {
    if let Some(energy) = evaluation.ca_energy {
        writeln!(out, "Ca VDW: {}", general(energy))?;
    }
    if let Some(energy) = evaluation.max_ca_energy {
        writeln!(out, "Ca VDW: {}", general(energy))?;
    }

    if request.evaluate {
        for medium in &evaluation.media {
            let rmsd = medium
                .fit
                .as_ref()
                .map_or_else(|| UNAVAILABLE.to_string(), |fit| general(fit.rmsd));
            write!(out, "{} {} ", rmsd, medium.reduced_count)?;
        }
        let total = evaluation
            .total_rmsd
            .map_or_else(|| UNAVAILABLE.to_string(), general);
        writeln!(out, "{total}")?;
    }

    if request.order_tensors {
        for (m, tensor) in evaluation.tensors().enumerate() {
            match tensor {
                Some(tensor) => {
                    writeln!(out, "S{}  : ", m + 1)?;
                    write_tensor(out, tensor)?;
                }
                None => writeln!(out, "S{}  : {UNAVAILABLE}", m + 1)?,
            }
        }
    }

    if request.reference.is_some() {
        match &evaluation.distances {
            Some(distances) => {
                for (m, d) in distances.per_medium.iter().enumerate() {
                    writeln!(out, "d({m}) = {}", scientific(*d, 3))?;
                }
                writeln!(out, "Total OT distance:{}", scientific(distances.total, 3))?;
            }
            None => writeln!(out, "Total OT distance:{UNAVAILABLE}")?,
        }
    }

    Ok(())
}
