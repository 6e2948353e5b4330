pub mod codec;

use crate::error::FtpError;

/// Longest virtual path the server will build, in bytes.
pub const PATH_MAX: usize = 4096;

/// Builds the canonical absolute path named by a client argument.
///
/// `base` is the session's current directory (absolute, separator
/// normalized). Absolute arguments are taken verbatim, relative ones are
/// joined to `base` with a single separator. Arguments containing a `..`
/// segment or a doubled separator are rejected rather than stripped, so a
/// traversal attempt never silently turns into a different valid path.
///
/// # Arguments
///
/// * `base` - The directory relative arguments are resolved against.
/// * `arg` - The client-supplied path argument, already NUL-decoded.
///
/// # Returns
///
/// The canonical absolute path, or an `FtpError` describing the rejection.
pub fn build_path(base: &str, arg: &str) -> Result<String, FtpError> {
    if arg.contains("//") {
        return Err(FtpError::DoubledSeparator(arg.to_string()));
    }
    if arg.split('/').any(|segment| segment == "..") {
        return Err(FtpError::PathTraversal(arg.to_string()));
    }

    let mut path = if arg.starts_with('/') {
        arg.to_string()
    } else if arg.is_empty() {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, arg)
    } else {
        format!("{}/{}", base, arg)
    };

    if path.len() > PATH_MAX {
        return Err(FtpError::PathTooLong(PATH_MAX));
    }

    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if path.is_empty() {
        path.push('/');
    }

    Ok(path)
}

/// Splits a canonical path into its parent directory and final component.
/// The parent of the root is the root itself.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("/", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_argument_joins_base() {
        assert_eq!(build_path("/saves", "zelda").unwrap(), "/saves/zelda");
        assert_eq!(build_path("/", "zelda").unwrap(), "/zelda");
    }

    #[test]
    fn absolute_argument_is_verbatim() {
        assert_eq!(build_path("/saves", "/backup/a").unwrap(), "/backup/a");
    }

    #[test]
    fn empty_argument_collapses_to_base() {
        assert_eq!(build_path("/saves", "").unwrap(), "/saves");
        assert_eq!(build_path("/", "").unwrap(), "/");
    }

    #[test]
    fn trailing_separators_are_stripped() {
        assert_eq!(build_path("/", "saves/").unwrap(), "/saves");
        assert_eq!(build_path("/saves", "/").unwrap(), "/");
    }

    #[test]
    fn parent_segments_are_rejected() {
        assert!(matches!(
            build_path("/saves", ".."),
            Err(FtpError::PathTraversal(_))
        ));
        assert!(matches!(
            build_path("/saves", "a/../b"),
            Err(FtpError::PathTraversal(_))
        ));
        assert!(matches!(
            build_path("/saves", "/x/.."),
            Err(FtpError::PathTraversal(_))
        ));
        // A name merely containing dots is fine.
        assert_eq!(build_path("/", "..a").unwrap(), "/..a");
    }

    #[test]
    fn doubled_separators_are_rejected() {
        assert!(matches!(
            build_path("/saves", "a//b"),
            Err(FtpError::DoubledSeparator(_))
        ));
    }

    #[test]
    fn overlong_paths_are_rejected() {
        let long = "a".repeat(PATH_MAX + 1);
        assert!(matches!(
            build_path("/", &long),
            Err(FtpError::PathTooLong(_))
        ));
    }

    #[test]
    fn split_parent_handles_root_children() {
        assert_eq!(split_parent("/saves/zelda"), ("/saves", "zelda"));
        assert_eq!(split_parent("/zelda"), ("/", "zelda"));
    }
}
