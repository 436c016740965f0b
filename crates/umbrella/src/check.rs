//! Startup summary printed by `umbrella --check`.

use std::fmt::Write as _;

use umbrella_runtime::UmbrellaRuntime;

/// Describes what `runtime` would serve: the listen address, forward root,
/// auth state and one line per registered command.
pub fn summary(runtime: &UmbrellaRuntime) -> String {
    let config = runtime.config();
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "listen:   {}{}",
        config.server.bind_addr(),
        config.server.path
    );
    let _ = writeln!(
        out,
        "forward:  {}",
        config.forward.request_url_root.as_deref().unwrap_or_default()
    );
    let auth = if config.auth.enabled {
        "enabled"
    } else {
        "disabled"
    };
    let _ = writeln!(out, "auth:     {auth}");

    let registry = runtime.registry();
    for name in registry.commands() {
        let functions = registry
            .command(name)
            .map(|record| record.function_names().join(", "))
            .unwrap_or_default();
        let _ = writeln!(out, "command:  /{name} [{functions}]");
    }
    out
}
