use super::error::ReconcileError;

/// Sequential invoice number generator.
///
/// Produces `{prefix}{sequence}` with the sequence zero-padded, e.g.
/// "INV-0001", "INV-0002". Numbers are never reused within a sequence.
#[derive(Debug, Clone)]
pub struct InvoiceNumberSequence {
    prefix: String,
    next: u64,
    width: usize,
}

impl InvoiceNumberSequence {
    /// Create a new sequence starting at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            width: 4,
        }
    }

    /// Resume after the highest number already issued under `prefix`.
    ///
    /// Numbers with a different prefix or a non-numeric suffix are ignored,
    /// so manually numbered invoices do not break the sequence.
    pub fn continue_after<'a>(
        prefix: impl Into<String>,
        existing: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let prefix = prefix.into();
        let highest = existing
            .into_iter()
            .filter_map(|n| n.strip_prefix(prefix.as_str()))
            .filter_map(|seq| seq.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            prefix,
            next: highest.saturating_add(1),
            width: 4,
        }
    }

    /// Set zero-padding width (default: 4, so "0001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Issue the next invoice number.
    pub fn next_number(&mut self) -> Result<String, ReconcileError> {
        let number = self.peek();
        self.next = self.next.checked_add(1).ok_or_else(|| {
            ReconcileError::Numbering(format!("sequence '{}' is exhausted", self.prefix))
        })?;
        Ok(number)
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self) -> String {
        format!("{}{:0>width$}", self.prefix, self.next, width = self.width)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
