use redcraft::core::tensor::OrderTensor;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Invalid number '{0}' in reference tensors.")]
    InvalidNumber(String),

    #[error(
        "Reference tensors need 5 values (Sxx Syy Sxy Sxz Syz) per medium: expected {expected} for {media} media, found {found}."
    )]
    WrongCount {
        media: usize,
        expected: usize,
        found: usize,
    },
}

/// Parses `Sxx Syy Sxy Sxz Syz` for each of `media` alignment media.
pub fn parse_reference_tensors(text: &str, media: usize) -> Result<Vec<OrderTensor>, ReferenceError> {
    let values = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| ReferenceError::InvalidNumber(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expected = media * 5;
    if values.len() != expected {
        return Err(ReferenceError::WrongCount {
            media,
            expected,
            found: values.len(),
        });
    }

    Ok(values
        .chunks_exact(5)
        .map(|c| OrderTensor::new(c[0], c[1], c[2], c[3], c[4]))
        .collect())
}
