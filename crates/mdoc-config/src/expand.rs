//! Environment variable expansion for configuration strings.
//!
//! Only the braced forms are recognized:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a single config value.
///
/// Values without `${` are returned untouched, so a renderer argument such as
/// `$HOME` or a URL containing `$` survives as written.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar {
            name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.name),
    })
}

/// Expand every entry of a list value, naming the failing index in errors.
pub(crate) fn expand_env_all(values: &mut [String], field: &str) -> Result<(), ConfigError> {
    for (i, value) in values.iter_mut().enumerate() {
        *value = expand_env(value, &format!("{field}[{i}]"))?;
    }
    Ok(())
}

/// Lookup failure for an unset variable.
struct UnsetVar {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDOC_TEST_JAR", "/opt/plantuml.jar");
        }
        let result = expand_env("${MDOC_TEST_JAR}", "plantuml.command").unwrap();
        assert_eq!(result, "/opt/plantuml.jar");
        unsafe {
            std::env::remove_var("MDOC_TEST_JAR");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDOC_UNSET_JAVA");
        }
        let result = expand_env("${MDOC_UNSET_JAVA:-java}", "plantuml.command").unwrap();
        assert_eq!(result, "java");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDOC_MISSING_VAR");
        }
        let err = expand_env("${MDOC_MISSING_VAR}", "intersphinx.python").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MDOC_MISSING_VAR"));
        assert!(err.to_string().contains("intersphinx.python"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDOC_TEST_TOOLS", "/usr/share/tools");
        }
        let result = expand_env("${MDOC_TEST_TOOLS}/plantuml.jar", "plantuml.command").unwrap();
        assert_eq!(result, "/usr/share/tools/plantuml.jar");
        unsafe {
            std::env::remove_var("MDOC_TEST_TOOLS");
        }
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("$HOME/plantuml.jar", "plantuml.command").unwrap();
        assert_eq!(result, "$HOME/plantuml.jar");
    }

    #[test]
    fn test_expand_all_reports_index() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDOC_MISSING_ARG");
        }
        let mut values = vec!["java".to_owned(), "${MDOC_MISSING_ARG}".to_owned()];
        let err = expand_env_all(&mut values, "plantuml.command").unwrap_err();
        assert!(err.to_string().contains("plantuml.command[1]"));
    }
}
