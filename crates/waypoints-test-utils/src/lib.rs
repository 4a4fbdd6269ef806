pub mod sandbox;

pub use insta;

/// Assert a named snapshot stored next to the calling test file.
///
/// Snapshots are named without the module prefix so `tests/snapshots/<name>.snap`
/// stays easy to find. Review changes with `cargo insta review`.
#[macro_export]
macro_rules! assert_snapshot {
    ($name:expr, $value:expr) => {{
        let mut settings = $crate::insta::Settings::clone_current();
        settings.set_prepend_module_to_snapshot(false);
        settings.bind(|| {
            $crate::insta::assert_snapshot!($name, $value);
        });
    }};
}
