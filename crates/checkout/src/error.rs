//! Checkout error types.

use common::ProductId;
use domain::DomainError;
use thiserror::Error;

/// Outcome of rolling back stock reservations after a failed checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    /// Reservations that were handed back.
    pub restored: Vec<ProductId>,
    /// Reservations that could not be handed back, with the reason.
    pub failed: Vec<(ProductId, String)>,
}

impl CompensationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Errors returned by [`crate::CheckoutCoordinator::checkout`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout failed before any stock was reserved.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// Checkout failed after reserving stock. The reservations were rolled
    /// back as recorded in `report`.
    #[error("{source}")]
    Compensated {
        source: DomainError,
        report: CompensationReport,
    },
}

impl CheckoutError {
    /// The failure that stopped the checkout.
    pub fn domain(&self) -> &DomainError {
        match self {
            CheckoutError::Rejected(err) => err,
            CheckoutError::Compensated { source, .. } => source,
        }
    }

    pub fn into_domain(self) -> DomainError {
        match self {
            CheckoutError::Rejected(err) => err,
            CheckoutError::Compensated { source, .. } => source,
        }
    }

    /// Label for `checkout_failed_total`.
    pub fn reason(&self) -> &'static str {
        self.domain().kind()
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensated_error_reads_like_its_cause() {
        let err = CheckoutError::Compensated {
            source: DomainError::invalid("boom"),
            report: CompensationReport::default(),
        };
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.reason(), "invalid_argument");
        assert!(matches!(err.into_domain(), DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_report_is_complete_without_failures() {
        let mut report = CompensationReport::default();
        report.restored.push(ProductId::new());
        assert!(report.is_complete());
        report.failed.push((ProductId::new(), "gone".to_string()));
        assert!(!report.is_complete());
    }
}
