use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// 給 cron / systemd 等非互動環境收集日誌用
    Json,
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "contact_sync=debug,info"
    } else {
        "contact_sync=info"
    }
}

fn base_layer<S>() -> fmt::Layer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// `RUST_LOG` 優先，其次依 verbose 決定預設層級
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let (compact, json) = match format {
        LogFormat::Compact => (Some(base_layer().compact()), None),
        LogFormat::Json => (None, Some(base_layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_follow_verbose_flag() {
        assert_eq!(default_directives(false), "contact_sync=info");
        assert_eq!(default_directives(true), "contact_sync=debug,info");
        assert!(EnvFilter::try_new(default_directives(true)).is_ok());
    }
}
