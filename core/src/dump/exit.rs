use std::process::ExitStatus;

/// Collapses an exit status into one code. A process ended by signal `s`
/// reports `128 + s`, so a killed dump never reads as success.
pub fn normalize_exit(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| killed_by(status).map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(unix)]
fn killed_by(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn killed_by(_: ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn plain_exit_codes_pass_through() {
        assert_eq!(normalize_exit(ExitStatus::from_raw(0)), 0);
        assert_eq!(normalize_exit(ExitStatus::from_raw(2 << 8)), 2);
    }

    #[test]
    fn signals_map_above_128() {
        // raw wait status 9 == terminated by SIGKILL
        assert_eq!(normalize_exit(ExitStatus::from_raw(9)), 137);
    }
}
