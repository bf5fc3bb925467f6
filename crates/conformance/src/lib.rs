//! Conformance checks for `micro-client` request factories.
//!
//! Any [`ClientHttpRequestFactory`](micro_client::client::ClientHttpRequestFactory)
//! implementation is expected to behave the same way against the same server. This
//! crate ships that server, [`ReferenceServer`], the checks themselves in [`suite`],
//! and [`conformance_suite!`] to turn them into tests:
//!
//! ```no_run
//! mod simple {
//!     micro_client_conformance::conformance_suite!(micro_client::client::SimpleClientHttpRequestFactory::default());
//! }
//! ```
//!
//! The generated tests are `#[tokio::test]` functions, so the crate invoking the
//! macro needs `tokio` with the `macros` and `rt` features among its
//! dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! micro-client-conformance = { path = "../conformance" }
//! tokio = { version = "1", features = ["macros", "rt"] }
//! ```

mod codec;
mod routes;
mod server;
pub mod suite;

pub use server::ReferenceServer;

use tracing::Level;

/// Sends `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_max_level(Level::DEBUG).with_test_writer().try_init();
}

/// Generates one `#[tokio::test]` per check in [`suite`], each against a fresh
/// [`ReferenceServer`] and a factory built from the given expression.
///
/// The expansion names `::tokio` directly: the invoking crate must depend on
/// `tokio` with the `macros` and `rt` features.
#[macro_export]
macro_rules! conformance_suite {
    ($factory:expr) => {
        $crate::conformance_suite!(@cases $factory;
            status,
            echo,
            multiple_writes,
            headers_after_execute,
            http_methods,
            empty_post_body,
            close_releases,
            invalid_uri,
        );
    };
    (@cases $factory:expr; $($case:ident),* $(,)?) => {
        $(
            #[::tokio::test]
            async fn $case() {
                $crate::init_tracing();
                let server = $crate::ReferenceServer::start().await.expect("reference server should start");
                let factory = $factory;
                if let Err(e) = $crate::suite::$case(&factory, &server).await {
                    panic!("{} failed: {e}", stringify!($case));
                }
            }
        )*
    };
}
