//! The canonical event-type names §4.11 produces. Kept as plain `&str`
//! constants rather than an enum: webhook subscriptions match against the
//! wire string (including the `"*"` wildcard), so the string *is* the
//! contract.

pub mod payment_intent {
    pub const CREATED: &str = "payment_intent.created";
    pub const PROCESSING: &str = "payment_intent.processing";
    pub const REQUIRES_ACTION: &str = "payment_intent.requires_action";
    pub const SUCCEEDED: &str = "payment_intent.succeeded";
    pub const FAILED: &str = "payment_intent.failed";
    pub const CANCELED: &str = "payment_intent.canceled";
}

pub mod charge {
    pub const AUTHORIZED: &str = "charge.authorized";
    pub const CAPTURED: &str = "charge.captured";
    pub const FAILED: &str = "charge.failed";
    pub const VOIDED: &str = "charge.voided";
}

pub mod refund {
    pub const CREATED: &str = "refund.created";
    pub const SUCCEEDED: &str = "refund.succeeded";
    pub const FAILED: &str = "refund.failed";
}

pub mod customer {
    pub const CREATED: &str = "customer.created";
    pub const UPDATED: &str = "customer.updated";
    pub const DELETED: &str = "customer.deleted";
}
