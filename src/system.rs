//! Host and user information.

use crate::env::Environment;
use crate::error::SystemError;
use crate::exec::Executor;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const OS_RELEASE: &str = "/etc/os-release";

/// Platform, distribution and version of the host, e.g. `("Linux", "ubuntu", "24.04")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub platform: String,
    pub id: String,
    pub version: String,
}

/// Identify the host from `/etc/os-release`, or from `ver` on Windows.
///
/// Other hosts are reported as [`SystemError::Unsupported`].
pub fn os_info() -> Result<OsInfo, SystemError> {
    let platform = platform_name();
    if Path::new(OS_RELEASE).is_file() {
        let text = fs::read_to_string(OS_RELEASE)?;
        return os_info_from_release(platform, &text);
    }
    if cfg!(windows) {
        let result = Executor::default().run(&["cmd", "/C", "ver"])?;
        let version =
            parse_windows_ver(&result.stdout_text()).ok_or(SystemError::MissingField("version"))?;
        return Ok(OsInfo {
            platform,
            id: "windows".to_string(),
            version,
        });
    }
    Err(SystemError::Unsupported(platform))
}

/// Version number from the output of `ver`, e.g. `Microsoft Windows [Version 10.0.22631.4317]`.
pub(crate) fn parse_windows_ver(text: &str) -> Option<String> {
    let (_, rest) = text.split_once('[')?;
    let (inner, _) = rest.split_once(']')?;
    inner.split_whitespace().last().map(str::to_string)
}

pub(crate) fn os_info_from_release(platform: String, text: &str) -> Result<OsInfo, SystemError> {
    let fields = parse_os_release(text);
    let field = |key: &'static str| {
        fields
            .get(key)
            .cloned()
            .ok_or(SystemError::MissingField(key))
    };
    Ok(OsInfo {
        platform,
        id: field("ID")?,
        // Rolling releases such as Arch carry no VERSION_ID.
        version: field("VERSION_ID").unwrap_or_default(),
    })
}

/// `KEY=value` pairs of an os-release file, with quotes stripped.
pub fn parse_os_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches(['"', '\'']).to_string()))
        .collect()
}

fn platform_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

/// Name of the invoking user from `USER` or `USERNAME`.
pub fn user_name(env: &Environment) -> Option<String> {
    env.get_var("USER").or_else(|| env.get_var("USERNAME"))
}

/// Numeric id of the invoking user.
#[cfg(unix)]
pub fn uid(_env: &Environment) -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail.
    Some(unsafe { libc::getuid() })
}

/// Numeric id of the invoking user, from `UID` where the platform has no such call.
#[cfg(not(unix))]
pub fn uid(env: &Environment) -> Option<u32> {
    env.get_var("UID").and_then(|uid| uid.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = r#"
PRETTY_NAME="Ubuntu 24.04.1 LTS"
NAME="Ubuntu"
VERSION_ID="24.04"
# comment
ID=ubuntu
"#;

    #[test]
    fn test_parse_os_release() {
        let fields = parse_os_release(UBUNTU);
        assert_eq!(fields["ID"], "ubuntu");
        assert_eq!(fields["VERSION_ID"], "24.04");
        assert_eq!(fields["PRETTY_NAME"], "Ubuntu 24.04.1 LTS");
        assert!(!fields.contains_key("# comment"));
    }

    #[test]
    fn test_os_info_from_release() {
        let info = os_info_from_release("Linux".to_string(), UBUNTU).unwrap();
        assert_eq!(
            info,
            OsInfo {
                platform: "Linux".to_string(),
                id: "ubuntu".to_string(),
                version: "24.04".to_string()
            }
        );
        let err = os_info_from_release("Linux".to_string(), "NAME=x").unwrap_err();
        assert!(matches!(err, SystemError::MissingField("ID")));
    }

    #[test]
    fn test_parse_windows_ver() {
        assert_eq!(
            parse_windows_ver("\r\nMicrosoft Windows [Version 10.0.22631.4317]\r\n").as_deref(),
            Some("10.0.22631.4317")
        );
        assert_eq!(
            parse_windows_ver("Microsoft Windows [Versión 10.0.19045.5011]").as_deref(),
            Some("10.0.19045.5011")
        );
        assert_eq!(parse_windows_ver("no brackets"), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_uid_matches_process_owner() {
        use std::os::unix::fs::MetadataExt;

        let tmp = tempfile::tempdir().unwrap();
        let owner = fs::metadata(tmp.path()).unwrap().uid();
        assert_eq!(uid(&Environment::empty("/")), Some(owner));
    }

    #[test]
    fn test_user_name_fallback() {
        let mut env = Environment::empty("/");
        assert_eq!(user_name(&env), None);
        env.set_var("USERNAME", "sm");
        assert_eq!(user_name(&env).as_deref(), Some("sm"));
        env.set_var("USER", "root");
        assert_eq!(user_name(&env).as_deref(), Some("root"));
    }
}
