use crate::contract::Vendor;

/// Fixed object name the published snapshot overwrites on every run.
pub fn snapshot_object_name(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Hero => "hero.json",
        Vendor::Zero => "zero.json",
    }
}

/// Object name the batch runner checkpoints partial results under.
pub fn checkpoint_object_name(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Hero => "hero.checkpoint.json",
        Vendor::Zero => "zero.checkpoint.json",
    }
}

/// Object name the filtered company list is checkpointed under before the
/// batch phase starts.
pub fn companies_object_name(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Hero => "hero.companies.json",
        Vendor::Zero => "zero.companies.json",
    }
}
