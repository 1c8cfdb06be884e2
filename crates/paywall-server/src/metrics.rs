use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::{LazyLock, Once};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static INVOICES_MINTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "paywall_invoices_minted_total",
        "Total number of invoices minted",
    )
    .unwrap()
});

pub static INVOICE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "paywall_invoice_failures_total",
            "Failed mint attempts by error kind",
        ),
        &["kind"],
    )
    .unwrap()
});

pub static ASSET_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "paywall_asset_requests_total",
            "Asset requests by access state",
        ),
        &["access"],
    )
    .unwrap()
});

pub static UPLOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("paywall_uploads_total", "Uploads by outcome"),
        &["result"],
    )
    .unwrap()
});

static REGISTER: Once = Once::new();

/// Register all metrics with the registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(INVOICES_MINTED.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(INVOICE_FAILURES.clone()))
            .unwrap();
        REGISTRY.register(Box::new(ASSET_REQUESTS.clone())).unwrap();
        REGISTRY.register(Box::new(UPLOADS.clone())).unwrap();
    });
}
