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

//! Privilege drop, chroot and PID file handling for the Daemon Harness
//! (C8, spec §4.8): "if running as root, change process UID/GID to
//! configured unprivileged user/group before accepting any connection;
//! optionally chroot; write a PID file."

/// Errors raised while dropping privileges, chrooting, or writing the PID
/// file. All are fatal at startup, per spec §7.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("unknown group {0:?}")]
    UnknownGroup(String),
    #[error("cannot chroot to {path:?}: {source}")]
    Chroot {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("cannot change directory to {path:?}: {source}")]
    Chdir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("cannot drop group privileges to {group:?}: {source}")]
    SetGid {
        group: String,
        source: std::io::Error,
    },
    #[error("cannot drop user privileges to {user:?}: {source}")]
    SetUid {
        user: String,
        source: std::io::Error,
    },
    #[error("cannot write PID file {path:?}: {source}")]
    PidFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Chroot into `dir` and change the working directory to `/` inside it.
/// Must be called while still root, and before [`drop_privileges`].
///
/// # Errors
///
/// Returns [`HarnessError::Chroot`] or [`HarnessError::Chdir`] if the
/// underlying syscalls fail.
pub fn chroot(dir: &std::path::Path) -> Result<(), HarnessError> {
    let c_path = std::ffi::CString::new(dir.as_os_str().as_encoded_bytes())
        .map_err(|source| HarnessError::Chroot {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, source),
        })?;

    #[allow(unsafe_code)]
    // SAFETY: ffi call with a valid, nul-terminated path.
    let result = unsafe { libc::chroot(c_path.as_ptr()) };
    if result != 0 {
        return Err(HarnessError::Chroot {
            path: dir.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    std::env::set_current_dir("/").map_err(|source| HarnessError::Chdir {
        path: std::path::PathBuf::from("/"),
        source,
    })
}

/// Permanently drop from root to the named unprivileged group and user, in
/// that order (group first, since `setuid` revokes the ability to change
/// the group afterwards). A no-op for either identity left unset.
///
/// # Errors
///
/// Returns [`HarnessError::UnknownUser`]/[`HarnessError::UnknownGroup`] if
/// the name does not resolve, or [`HarnessError::SetGid`]/
/// [`HarnessError::SetUid`] if the underlying syscalls fail.
pub fn drop_privileges(user: Option<&str>, group: Option<&str>) -> Result<(), HarnessError> {
    if let Some(group) = group {
        let entry = users::get_group_by_name(group).ok_or_else(|| HarnessError::UnknownGroup(group.to_owned()))?;
        let gid = entry.gid();
        #[allow(unsafe_code)]
        // SAFETY: ffi call, gid comes from a successful getgrnam lookup.
        let result = unsafe { libc::setgid(gid) };
        if result != 0 {
            return Err(HarnessError::SetGid {
                group: group.to_owned(),
                source: std::io::Error::last_os_error(),
            });
        }
    }

    if let Some(user) = user {
        let entry = users::get_user_by_name(user).ok_or_else(|| HarnessError::UnknownUser(user.to_owned()))?;
        let uid = entry.uid();
        #[allow(unsafe_code)]
        // SAFETY: ffi call, uid comes from a successful getpwnam lookup.
        let result = unsafe { libc::setuid(uid) };
        if result != 0 {
            return Err(HarnessError::SetUid {
                user: user.to_owned(),
                source: std::io::Error::last_os_error(),
            });
        }
    }

    Ok(())
}

/// `true` if the current process is running as root, i.e. privilege drop
/// is possible and (per spec §4.8) required before accepting connections.
#[must_use]
pub fn running_as_root() -> bool {
    #[allow(unsafe_code)]
    // SAFETY: ffi call, no arguments, cannot fail.
    let uid = unsafe { libc::getuid() };
    uid == 0
}

/// Write the current process id to `path`, truncating any existing file.
///
/// # Errors
///
/// Returns [`HarnessError::PidFile`] if the file cannot be created or
/// written.
pub fn write_pid_file(path: &std::path::Path) -> Result<(), HarnessError> {
    #[allow(unsafe_code)]
    // SAFETY: ffi call, no arguments, cannot fail.
    let pid = unsafe { libc::getpid() };
    std::fs::write(path, format!("{pid}\n")).map_err(|source| HarnessError::PidFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_is_reported_by_name() {
        let err = drop_privileges(Some("no-such-user-dkimoracle-test"), None).unwrap_err();
        assert!(matches!(err, HarnessError::UnknownUser(ref name) if name == "no-such-user-dkimoracle-test"));
    }

    #[test]
    fn unknown_group_is_reported_by_name() {
        let err = drop_privileges(None, Some("no-such-group-dkimoracle-test")).unwrap_err();
        assert!(matches!(err, HarnessError::UnknownGroup(ref name) if name == "no-such-group-dkimoracle-test"));
    }

    #[test]
    fn writes_current_pid() {
        let path = std::env::temp_dir().join(format!("dkimoracled-test-{}.pid", std::process::id()));
        write_pid_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reports_missing_parent_directory() {
        let path = std::path::PathBuf::from("/no/such/directory/dkimoracled.pid");
        assert!(write_pid_file(&path).is_err());
    }
}
