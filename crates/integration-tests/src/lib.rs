//! Test registry shared by the integration test binary

use color_eyre::Result;

/// A registered integration test
pub struct IntegrationTest {
    pub name: &'static str,
    pub f: fn() -> Result<()>,
}

/// All tests registered with [`integration_test!`]
#[linkme::distributed_slice]
pub static INTEGRATION_TESTS: [IntegrationTest];

/// Register a `fn() -> Result<()>` as an integration test.
#[macro_export]
macro_rules! integration_test {
    ($fn_name:ident) => {
        const _: () = {
            #[::linkme::distributed_slice($crate::INTEGRATION_TESTS)]
            static TEST: $crate::IntegrationTest = $crate::IntegrationTest {
                name: stringify!($fn_name),
                f: $fn_name,
            };
        };
    };
}
