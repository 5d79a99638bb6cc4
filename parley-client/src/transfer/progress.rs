use std::fmt;

/// Bytes moved so far out of the declared total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_done: u64,
    pub total: u64,
}

impl TransferProgress {
    pub fn new(bytes_done: u64, total: u64) -> Self {
        Self { bytes_done, total }
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.bytes_done as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_done >= self.total
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} bytes ({:.0}%)",
            self.bytes_done,
            self.total,
            self.fraction() * 100.0
        )
    }
}
