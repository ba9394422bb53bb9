use domain::PricingPolicy;

/// Settings shared by the checkout coordinator and the order lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutPolicy {
    pub pricing: PricingPolicy,
    /// When set, admin status updates must follow the lifecycle table.
    /// Otherwise any status may be set from any other.
    pub strict_status_transitions: bool,
}

impl CheckoutPolicy {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_status_transitions = strict;
        self
    }
}
