use super::ExtractionError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Reject uploads that cannot be a usable PDF before any network call.
pub fn validate_pdf(bytes: &[u8], max_size_mb: u64) -> Result<(), ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyPdf);
    }

    let max_bytes = max_size_mb.saturating_mul(1024 * 1024);
    if bytes.len() as u64 > max_bytes {
        return Err(ExtractionError::PdfTooLarge {
            size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            max_mb: max_size_mb,
        });
    }

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractionError::NotPdf);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_small_pdf() {
        assert!(validate_pdf(b"%PDF-1.7\n...", 10).is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(validate_pdf(b"", 10), Err(ExtractionError::EmptyPdf)));
    }

    #[test]
    fn rejects_oversized() {
        let mut big = b"%PDF-1.4\n".to_vec();
        big.resize(1024 * 1024 + 1, b'0');
        let err = validate_pdf(&big, 1).unwrap_err();
        assert!(matches!(err, ExtractionError::PdfTooLarge { max_mb: 1, .. }));
        assert!(err.to_string().contains("Maximum: 1 MB"));
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(1024 * 1024, b'0');
        assert!(validate_pdf(&pdf, 1).is_ok());
    }

    #[test]
    fn rejects_non_pdf() {
        assert!(matches!(
            validate_pdf(b"PK\x03\x04zip", 10),
            Err(ExtractionError::NotPdf)
        ));
    }
}
