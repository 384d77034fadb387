/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

//! Tracing setup for the daemon (spec §4.8, §4.9): a `tracing_subscriber`
//! registry with an `EnvFilter` driven by `DaemonSettings::log_level`, and
//! (behind the `syslog` feature) a `tracing-rfc-5424` layer in place of the
//! default stderr layer.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use dkimoracle_config::DaemonSettings;

/// The daemon's internal 0-5 severity scale, mapped to syslog priorities
/// `{err, warning, notice, info, debug}` per spec §4.8. Levels above 4
/// clamp to `debug`; this is also the scale used to derive the
/// `EnvFilter` default when not running under the `syslog` feature.
#[must_use]
pub fn syslog_priority_name(level: u8) -> &'static str {
    match level {
        0 => "err",
        1 => "warning",
        2 => "notice",
        3 => "info",
        _ => "debug",
    }
}

fn level_filter_for(level: u8) -> tracing_subscriber::filter::LevelFilter {
    use tracing_subscriber::filter::LevelFilter;
    match level {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 | 3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Maps a configured facility name to the `tracing-rfc-5424` facility code.
/// Defaults to `mail` per spec §4.8, both for the empty/unrecognized case
/// and as the literal default in [`DaemonSettings`].
#[cfg(feature = "syslog")]
#[must_use]
fn syslog_facility(name: &str) -> tracing_rfc_5424::facility::Facility {
    use tracing_rfc_5424::facility::Facility;
    match name.to_ascii_lowercase().as_str() {
        "kern" | "kernel" => Facility::Kernel,
        "user" => Facility::User,
        "daemon" => Facility::Daemon,
        "auth" => Facility::Auth,
        "syslog" => Facility::Syslog,
        "lpr" => Facility::Lpr,
        "news" => Facility::News,
        "uucp" => Facility::Uucp,
        "cron" => Facility::Cron,
        "authpriv" => Facility::AuthPriv,
        "ftp" => Facility::Ftp,
        "local0" => Facility::Local0,
        "local1" => Facility::Local1,
        "local2" => Facility::Local2,
        "local3" => Facility::Local3,
        "local4" => Facility::Local4,
        "local5" => Facility::Local5,
        "local6" => Facility::Local6,
        "local7" => Facility::Local7,
        _ => Facility::Mail,
    }
}

/// Install the global tracing subscriber. Called once at startup, before
/// any socket is bound.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed (should never
/// happen outside of tests, which use `test-log` instead).
pub fn init(settings: &DaemonSettings) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level_filter_for(settings.log_level).into())
        .from_env_lossy();

    #[cfg(feature = "syslog")]
    {
        match tracing_rfc_5424::transport::UnixSocketStream::new("/dev/log") {
            Ok(transport) => {
                let layer = tracing_rfc_5424::layer::Layer::with_transport(transport)
                    .with_facility(syslog_facility(&settings.syslog_facility))
                    .with_appname(settings.syslog_ident.clone());
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .init();
                return;
            }
            Err(error) => {
                eprintln!("dkimoracled: failed to open /dev/log, falling back to stderr: {error}");
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_names_follow_the_spec_table() {
        assert_eq!(syslog_priority_name(0), "err");
        assert_eq!(syslog_priority_name(1), "warning");
        assert_eq!(syslog_priority_name(2), "notice");
        assert_eq!(syslog_priority_name(3), "info");
        assert_eq!(syslog_priority_name(4), "debug");
        assert_eq!(syslog_priority_name(5), "debug");
    }

    #[cfg(feature = "syslog")]
    #[test]
    fn facility_defaults_to_mail() {
        use tracing_rfc_5424::facility::Facility;
        assert_eq!(syslog_facility("mail"), Facility::Mail);
        assert_eq!(syslog_facility(""), Facility::Mail);
        assert_eq!(syslog_facility("bogus"), Facility::Mail);
    }

    #[cfg(feature = "syslog")]
    #[test]
    fn facility_recognizes_local_and_daemon() {
        use tracing_rfc_5424::facility::Facility;
        assert_eq!(syslog_facility("daemon"), Facility::Daemon);
        assert_eq!(syslog_facility("LOCAL3"), Facility::Local3);
    }
}
