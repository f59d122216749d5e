/// Gapless payment order name sequence.
///
/// Generates names in the format `{prefix}{sequential}`, e.g. "PAY0001",
/// "PAY0002". The name doubles as the pain.008 message id, which must be
/// unique per creditor, so numbers are never reused.
#[derive(Debug, Clone)]
pub struct OrderSequence {
    prefix: String,
    next_number: u64,
    zero_pad: usize,
}

impl Default for OrderSequence {
    fn default() -> Self {
        Self::new("PAY")
    }
}

impl OrderSequence {
    /// Create a new sequence starting at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_number: 1,
            zero_pad: 4,
        }
    }

    /// Create a sequence continuing from a given number.
    pub fn starting_at(prefix: impl Into<String>, next_number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next_number,
            zero_pad: 4,
        }
    }

    /// Set zero-padding width (default: 4, so "0001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    /// Generate the next order name.
    pub fn next_name(&mut self) -> String {
        let name = self.peek();
        self.next_number += 1;
        name
    }

    /// Preview the next name without consuming it.
    pub fn peek(&self) -> String {
        format!(
            "{}{:0>width$}",
            self.prefix,
            self.next_number,
            width = self.zero_pad
        )
    }

    /// Get the next number that will be issued (without prefix/formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }
}
