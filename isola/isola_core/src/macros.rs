//! Macros shared by the Isola crates.

/// Log a checker event through the `log` facade.
///
/// Trailing `key => value` pairs are rendered after the message as
/// `(key=value, ...)`. The calling crate must depend on `log`.
///
/// # Examples
///
/// ```
/// use isola_core::log_event;
/// use isola_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "Checking program");
///
/// log_event!(LogLevel::Debug, "Classified reference",
///     decl => "increment",
///     restriction => "actor_self",
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr $(,)?) => {
        log::log!(
            $crate::utils::LogLevel::to_log_level($level),
            "{}",
            $message
        )
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        log::log!(
            $crate::utils::LogLevel::to_log_level($level),
            "{} ({})",
            $message,
            [$(format!("{}={}", stringify!($key), $value)),+].join(", ")
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::utils::LogLevel;

    #[test]
    fn test_log_event_macro() {
        log_event!(LogLevel::Info, "Program loaded");
        log_event!(LogLevel::Warning, "Conformance relaxed",
            decl => "decl#3",
            count => 2,
        );
    }
}
