//! Configuration structures for the instance-routing injector.
//!
//! - [`RoutingConfig`] - names and snippets the rewriters inject
//! - [`ScanConfig`] - which files are visited and how results are persisted
//! - [`Config`] - root configuration combining both
//!
//! All configuration types implement [`Default`] with the values used by the
//! tool-server layout (`src/schemas`, `src/server/tools`), and every struct is
//! `#[serde(default)]` so a config file only needs the keys it overrides.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names and code snippets injected into schemas and handlers.
///
/// # Examples
///
/// ```
/// use ir_core::RoutingConfig;
///
/// let routing = RoutingConfig::default();
/// assert_eq!(routing.routing_field, "instance");
/// assert_eq!(routing.spread_field(), "...instanceParameterSchema");
/// assert_eq!(
///     routing.resolution_statement(),
///     "const client = await getClientForInstance(clientOrFactory, instance);"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Field added to every handler's input (the injection marker for handlers).
    pub routing_field: String,

    /// Schema symbol spread into every schema body (the injection marker for schemas).
    pub spread_symbol: String,

    /// Module the spread symbol is imported from.
    pub spread_module: String,

    /// Callee text that introduces a schema definition.
    pub schema_factory: String,

    /// Required suffix for schema declaration names. Empty accepts any name.
    pub schema_suffix: String,

    /// Function that resolves a backend client for an instance.
    pub resolver_fn: String,

    /// Module the resolver is imported from. `None` leaves handler imports alone.
    pub resolver_module: Option<String>,

    /// Expression passed to the resolver as the client source.
    pub client_source: String,

    /// Local name the resolved client is bound to.
    pub client_binding: String,

    /// Name bound to the remaining fields in positional handlers.
    pub rest_binding: String,

    /// Type annotation added to handler parameters that have none.
    pub param_annotation: Option<String>,

    /// One level of indentation, used when a block has to be expanded.
    pub indent_unit: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routing_field: "instance".to_owned(),
            spread_symbol: "instanceParameterSchema".to_owned(),
            spread_module: "./common-schemas.js".to_owned(),
            schema_factory: "z.object".to_owned(),
            schema_suffix: "Schema".to_owned(),
            resolver_fn: "getClientForInstance".to_owned(),
            resolver_module: None,
            client_source: "clientOrFactory".to_owned(),
            client_binding: "client".to_owned(),
            rest_binding: "restParams".to_owned(),
            param_annotation: Some("any".to_owned()),
            indent_unit: "  ".to_owned(),
        }
    }
}

impl RoutingConfig {
    /// Returns the spread member injected into schema bodies.
    #[must_use]
    pub fn spread_field(&self) -> String {
        format!("...{}", self.spread_symbol)
    }

    /// Returns the statement that resolves the client for the routing field.
    #[must_use]
    pub fn resolution_statement(&self) -> String {
        format!(
            "const {} = await {}({}, {});",
            self.client_binding, self.resolver_fn, self.client_source, self.routing_field
        )
    }

    /// Returns the statement that splits a positional parameter into the
    /// routing field and the rest binding.
    ///
    /// # Examples
    ///
    /// ```
    /// use ir_core::RoutingConfig;
    ///
    /// let routing = RoutingConfig::default();
    /// assert_eq!(
    ///     routing.rebinding_statement("params"),
    ///     "const { instance, ...restParams } = params;"
    /// );
    /// ```
    #[must_use]
    pub fn rebinding_statement(&self, param: &str) -> String {
        format!(
            "const {{ {}, ...{} }} = {param};",
            self.routing_field, self.rest_binding
        )
    }

    /// Returns `true` if `name` qualifies as a schema declaration name.
    #[inline]
    #[must_use]
    pub fn is_schema_name(&self, name: &str) -> bool {
        name != self.spread_symbol && name.ends_with(self.schema_suffix.as_str())
    }

    /// Validates that every injected name is a usable identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let identifiers = [
            ("routing_field", &self.routing_field),
            ("spread_symbol", &self.spread_symbol),
            ("resolver_fn", &self.resolver_fn),
            ("client_binding", &self.client_binding),
            ("rest_binding", &self.rest_binding),
        ];

        for (option, value) in identifiers {
            if !is_identifier(value) {
                return Err(ConfigError::invalid_option(
                    option,
                    format!("'{value}' is not a valid identifier"),
                ));
            }
        }

        if self.schema_factory.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "schema_factory",
                "must not be empty",
            ));
        }

        if self.indent_unit.chars().any(|c| c != ' ' && c != '\t') {
            return Err(ConfigError::invalid_option(
                "indent_unit",
                "must contain only spaces or tabs",
            ));
        }

        Ok(())
    }
}

/// Which files are visited and how results are persisted.
///
/// # Examples
///
/// ```
/// use ir_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.is_excluded("common-schemas.ts"));
/// assert!(!config.is_excluded("card-schemas.ts"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directories walked for source files.
    pub roots: Vec<Utf8PathBuf>,

    /// Files processed in addition to the walked directories.
    pub files: Vec<Utf8PathBuf>,

    /// File names that never receive the routing field.
    pub exclude_files: Vec<String>,

    /// Directory names skipped in addition to the built-in list.
    pub skip_dirs: Vec<String>,

    /// File extensions to visit, without the leading dot.
    pub file_extensions: Vec<String>,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,

    /// Compute and report changes without writing them.
    pub dry_run: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                Utf8PathBuf::from("src/schemas"),
                Utf8PathBuf::from("src/server/tools"),
            ],
            files: Vec::new(),
            exclude_files: vec!["common-schemas.ts".to_owned(), "index.ts".to_owned()],
            skip_dirs: Vec::new(),
            file_extensions: vec!["ts".to_owned(), "tsx".to_owned()],
            follow_links: false,
            dry_run: false,
        }
    }
}

impl ScanConfig {
    /// Returns `true` if the file name is on the exclusion list.
    #[must_use]
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude_files.iter().any(|name| name == file_name)
    }

    /// Returns `true` if the path's file name is on the exclusion list.
    #[must_use]
    pub fn is_excluded_path(&self, path: &Utf8Path) -> bool {
        path.file_name().is_some_and(|name| self.is_excluded(name))
    }
}

/// Root configuration for the injector.
///
/// # Examples
///
/// ```
/// use ir_core::Config;
///
/// let config: Config = serde_json::from_str(r#"{"routing": {"rest_binding": "rest"}}"#)?;
/// assert_eq!(config.routing.rest_binding, "rest");
/// assert_eq!(config.routing.routing_field, "instance");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Injected names and snippets.
    pub routing: RoutingConfig,

    /// File selection and persistence.
    pub scan: ScanConfig,
}

impl Config {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`] if the file cannot be read
    /// - [`ConfigError::Parse`] if it is not valid JSON for [`Config`]
    /// - [`ConfigError::InvalidOption`] if validation fails
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for the first invalid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate()?;
        if self.scan.file_extensions.is_empty() {
            return Err(ConfigError::invalid_option(
                "file_extensions",
                "at least one extension is required",
            ));
        }
        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_config_defaults() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.routing_field, "instance");
        assert_eq!(routing.spread_symbol, "instanceParameterSchema");
        assert_eq!(routing.spread_module, "./common-schemas.js");
        assert!(routing.resolver_module.is_none());
        assert_eq!(routing.param_annotation.as_deref(), Some("any"));
    }

    #[test]
    fn test_is_schema_name() {
        let routing = RoutingConfig::default();
        assert!(routing.is_schema_name("createCardSchema"));
        assert!(!routing.is_schema_name("instanceParameterSchema"));
        assert!(!routing.is_schema_name("cardDefaults"));

        let any_name = RoutingConfig {
            schema_suffix: String::new(),
            ..RoutingConfig::default()
        };
        assert!(any_name.is_schema_name("cardDefaults"));
    }

    #[test]
    fn test_validate_rejects_bad_identifier() {
        let routing = RoutingConfig {
            rest_binding: "rest params".to_owned(),
            ..RoutingConfig::default()
        };
        let err = routing.validate().expect_err("space is not allowed");
        assert!(err.to_string().contains("rest_binding"));
    }

    #[test]
    fn test_validate_rejects_bad_indent() {
        let routing = RoutingConfig {
            indent_unit: "--".to_owned(),
            ..RoutingConfig::default()
        };
        assert!(routing.validate().is_err());
    }

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.roots.len(), 2);
        assert_eq!(config.file_extensions, vec!["ts", "tsx"]);
        assert!(!config.dry_run);
        assert!(config.is_excluded_path(Utf8Path::new("src/schemas/index.ts")));
        assert!(!config.is_excluded_path(Utf8Path::new("src/schemas/board-schemas.ts")));
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"scan": {"dry_run": true}}"#;
        let config: Config = serde_json::from_str(json).expect("valid config");
        assert!(config.scan.dry_run);
        assert_eq!(config.scan.exclude_files.len(), 2);
        assert_eq!(config.routing, RoutingConfig::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_validate_requires_extensions() {
        let mut config = Config::default();
        config.scan.file_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("restParams"));
        assert!(is_identifier("$client"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
    }
}
