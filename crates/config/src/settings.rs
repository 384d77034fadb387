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

/// The daemon's process-level configuration (spec §4.8, §6): listen
/// sockets, the unprivileged identity to drop to, an optional chroot
/// directory, the PID file, and logging parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSettings {
    #[serde(default = "default_listen")]
    pub listen: Vec<String>,
    #[serde(default)]
    pub listen_unix: Vec<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub chroot: Option<String>,
    pub pid_file: Option<String>,
    #[serde(default = "default_syslog_ident")]
    pub syslog_ident: String,
    #[serde(default = "default_syslog_facility")]
    pub syslog_facility: String,
    #[serde(default = "default_log_level")]
    pub log_level: u8,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            listen_unix: Vec::new(),
            user: None,
            group: None,
            chroot: None,
            pid_file: None,
            syslog_ident: default_syslog_ident(),
            syslog_facility: default_syslog_facility(),
            log_level: default_log_level(),
        }
    }
}

fn default_listen() -> Vec<String> {
    vec!["127.0.0.1:8891".to_owned()]
}

fn default_syslog_ident() -> String {
    "dkimoracled".to_owned()
}

fn default_syslog_facility() -> String {
    "mail".to_owned()
}

/// The internal 0-5 scale mapped to syslog priorities by the daemon
/// harness (spec §4.8): 0=err .. 5=debug.
const fn default_log_level() -> u8 {
    2
}
