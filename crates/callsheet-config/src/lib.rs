use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use callsheet_core::domain::phone::{
    DEFAULT_COUNTRY_CODE, DEFAULT_MIN_PHONE_DIGITS, DEFAULT_MOBILE_PREFIX,
};
use callsheet_core::domain::{ColumnRef, PhoneNormalizer, SheetAlias, SheetAliases, SheetSchema};
use callsheet_core::CoreError;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "callsheet";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const MAX_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub import: ImportConfig,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub normalizer: PhoneNormalizer,
    pub min_phone_digits: usize,
    pub batch_size: usize,
    pub max_input_bytes: u64,
    pub backup_dir: Option<PathBuf>,
    pub sheet_aliases: SheetAliases,
    pub sources: Vec<SheetSchema>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            normalizer: PhoneNormalizer::default(),
            min_phone_digits: DEFAULT_MIN_PHONE_DIGITS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            backup_dir: None,
            sheet_aliases: SheetAliases::default(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid numbering plan: {0}")]
    InvalidNumberingPlan(String),
    #[error("invalid import.min_phone_digits value: {0}")]
    InvalidMinPhoneDigits(usize),
    #[error("invalid import.batch_size value: {0}")]
    InvalidBatchSize(usize),
    #[error("invalid import.max_input_bytes value: {0}")]
    InvalidMaxInputBytes(u64),
    #[error("invalid import.backup_dir value: {0}")]
    InvalidBackupDir(PathBuf),
    #[error("invalid import.sheet_aliases entry: {0}")]
    InvalidSheetAlias(String),
    #[error("invalid import.sources entry {sheet}: {reason}")]
    InvalidSource { sheet: String, reason: String },
    #[error("duplicate import.sources sheet: {0}")]
    DuplicateSource(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    import: Option<ImportFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportFile {
    country_code: Option<String>,
    mobile_prefix: Option<String>,
    min_phone_digits: Option<usize>,
    batch_size: Option<usize>,
    max_input_bytes: Option<u64>,
    backup_dir: Option<PathBuf>,
    sheet_aliases: Option<Vec<SheetAliasFile>>,
    sources: Option<Vec<SourceFile>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetAliasFile {
    alias: String,
    canonical: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceFile {
    sheet: String,
    name: Vec<String>,
    phone: Vec<String>,
    group: Option<String>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = custom {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfigPath(path));
        }
        return Ok(path);
    }

    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => {
            let path = PathBuf::from(dir);
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            path
        }
        None => dirs::home_dir()
            .ok_or(ConfigError::MissingHomeDir)?
            .join(".config"),
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();
    if let Some(import) = parsed.import {
        config.import = merge_import(import)?;
    }
    Ok(config)
}

fn merge_import(file: ImportFile) -> Result<ImportConfig> {
    let mut import = ImportConfig::default();

    if file.country_code.is_some() || file.mobile_prefix.is_some() {
        let country_code = file.country_code.as_deref().unwrap_or(DEFAULT_COUNTRY_CODE);
        let mobile_prefix = match file.mobile_prefix.as_deref().map(str::trim) {
            None => DEFAULT_MOBILE_PREFIX,
            Some(raw) => single_char(raw).ok_or_else(|| {
                ConfigError::InvalidNumberingPlan(format!(
                    "mobile_prefix must be one digit, got {raw:?}"
                ))
            })?,
        };
        import.normalizer = PhoneNormalizer::new(country_code, mobile_prefix).map_err(|err| {
            match err {
                CoreError::InvalidNumberingPlan(reason) => ConfigError::InvalidNumberingPlan(reason),
                other => ConfigError::InvalidNumberingPlan(other.to_string()),
            }
        })?;
    }

    if let Some(digits) = file.min_phone_digits {
        if digits == 0 || digits > MAX_PHONE_DIGITS {
            return Err(ConfigError::InvalidMinPhoneDigits(digits));
        }
        import.min_phone_digits = digits;
    }

    if let Some(size) = file.batch_size {
        if size == 0 || size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize(size));
        }
        import.batch_size = size;
    }

    if let Some(bytes) = file.max_input_bytes {
        if bytes == 0 {
            return Err(ConfigError::InvalidMaxInputBytes(bytes));
        }
        import.max_input_bytes = bytes;
    }

    if let Some(dir) = file.backup_dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidBackupDir(dir));
        }
        import.backup_dir = Some(dir);
    }

    if let Some(aliases) = file.sheet_aliases {
        let entries = aliases
            .into_iter()
            .map(|entry| SheetAlias {
                alias: entry.alias,
                canonical: entry.canonical,
            })
            .collect();
        import.sheet_aliases =
            SheetAliases::new(entries).map_err(|err| ConfigError::InvalidSheetAlias(err.to_string()))?;
    }

    if let Some(sources) = file.sources {
        import.sources = parse_sources(sources)?;
    }

    Ok(import)
}

fn parse_sources(sources: Vec<SourceFile>) -> Result<Vec<SheetSchema>> {
    let mut seen = HashSet::new();
    let mut schemas = Vec::with_capacity(sources.len());
    for source in sources {
        let sheet = source.sheet.trim().to_string();
        let invalid = |reason: String| ConfigError::InvalidSource {
            sheet: sheet.clone(),
            reason,
        };
        let name = parse_columns(&source.name).map_err(|err| invalid(err.to_string()))?;
        let phone = parse_columns(&source.phone).map_err(|err| invalid(err.to_string()))?;
        let group = source
            .group
            .as_deref()
            .map(str::parse::<ColumnRef>)
            .transpose()
            .map_err(|err| invalid(err.to_string()))?;
        let schema = SheetSchema::configured(&sheet, name, phone, group).map_err(|err| match err {
            CoreError::InvalidSheetSchema { reason, .. } => invalid(reason),
            other => invalid(other.to_string()),
        })?;
        if !seen.insert(schema.sheet.clone()) {
            return Err(ConfigError::DuplicateSource(schema.sheet));
        }
        schemas.push(schema);
    }
    Ok(schemas)
}

fn parse_columns(raw: &[String]) -> std::result::Result<Vec<ColumnRef>, CoreError> {
    raw.iter().map(|value| value.parse()).collect()
}

fn single_char(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.permissions().mode() & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_at_path, ConfigError, DEFAULT_BATCH_SIZE};
    use callsheet_core::domain::ColumnRef;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    fn write_config(temp: &TempDir, contents: &str) -> PathBuf {
        let path = temp.path().join("config.toml");
        fs::write(&path, contents).expect("write config");
        restrict_permissions(&path);
        path
    }

    #[test]
    fn missing_file_is_an_error_only_when_required() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
        assert!(load_at_path(&missing, false).expect("optional").is_none());
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "");
        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.import.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.import.normalizer.country_code(), "972");
        assert_eq!(config.import.sheet_aliases.entries().len(), 1);
    }

    #[test]
    fn parses_import_section() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(
            &temp,
            r##"
[import]
country_code = "33"
mobile_prefix = "6"
min_phone_digits = 10
batch_size = 25
backup_dir = "/tmp/callsheet-backups"

[[import.sheet_aliases]]
alias = "Donors (copy)"
canonical = "Donors"

[[import.sources]]
sheet = "Contacts"
name = ["#1", "#0"]
phone = ["#2", "#3"]
group = "Group"
"##,
        );
        let config = load_at_path(&path, true).expect("load").expect("config");
        let import = config.import;
        assert_eq!(import.normalizer.country_code(), "33");
        assert_eq!(import.normalizer.mobile_prefix(), '6');
        assert_eq!(import.min_phone_digits, 10);
        assert_eq!(import.batch_size, 25);
        assert_eq!(import.sheet_aliases.canonical("Donors (copy)"), "Donors");
        assert_eq!(import.sources.len(), 1);
        let schema = &import.sources[0];
        assert_eq!(schema.sheet, "Contacts");
        assert_eq!(schema.name, vec![ColumnRef::Index(1), ColumnRef::Index(0)]);
        assert_eq!(schema.group, vec![ColumnRef::Header("Group".to_string())]);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "[import]\nbatch_size = 0\n");
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::InvalidBatchSize(0))
        ));

        let path = write_config(&temp, "[import]\nmobile_prefix = \"55\"\n");
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::InvalidNumberingPlan(_))
        ));
    }

    #[test]
    fn rejects_duplicate_and_empty_sources() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(
            &temp,
            "[import]\n[[import.sources]]\nsheet = \"A\"\nname = [\"#0\"]\nphone = [\"#1\"]\n\n[[import.sources]]\nsheet = \"A\"\nname = [\"#0\"]\nphone = [\"#2\"]\n",
        );
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::DuplicateSource(_))
        ));

        let path = write_config(
            &temp,
            "[import]\n[[import.sources]]\nsheet = \"A\"\nname = []\nphone = [\"#1\"]\n",
        );
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::InvalidSource { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "[import]\nbatchsize = 10\n");
        assert!(matches!(
            load_at_path(&path, true),
            Err(ConfigError::Parse { .. })
        ));
    }
}
