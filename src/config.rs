use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::types::{DEFAULT_PAGE_SIZE, DEFAULT_SORT};

/// Collections that can be opened by name.
pub const RESOURCE_NAMES: [&str; 4] = ["books", "messages", "newspapers", "courses"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Custom title for header (defaults to "ktadmin")
  pub title: Option<String>,
  pub auth: AuthConfig,
  pub resources: ResourcesConfig,
  #[serde(default)]
  pub list: ListConfig,
  /// Extra headers sent with every request
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
  /// First list shown after login
  pub default_resource: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  pub url: String,
  /// Pre-fills the login form
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Origin {
  pub url: String,
}

/// One origin per collection. They are allowed to differ.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesConfig {
  pub books: Origin,
  pub messages: Origin,
  pub newspapers: Origin,
  pub courses: Origin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  #[serde(default = "default_sort")]
  pub sort: String,
  /// Go back to page 1 when the search keyword changes
  #[serde(default)]
  pub reset_page_on_search: bool,
}

impl Default for ListConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      sort: default_sort(),
      reset_page_on_search: false,
    }
  }
}

fn default_page_size() -> u32 {
  DEFAULT_PAGE_SIZE
}

fn default_sort() -> String {
  DEFAULT_SORT.to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ktadmin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ktadmin/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/ktadmin/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ktadmin.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ktadmin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.list.page_size == 0 {
      return Err(eyre!("list.page_size must be greater than 0"));
    }
    if let Some(name) = &self.default_resource {
      Self::check_resource(name)?;
    }
    Ok(())
  }

  pub fn check_resource(name: &str) -> Result<()> {
    if RESOURCE_NAMES.contains(&name) {
      Ok(())
    } else {
      Err(eyre!(
        "Unknown resource '{}'. Expected one of: {}",
        name,
        RESOURCE_NAMES.join(", ")
      ))
    }
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("ktadmin")
  }

  pub fn default_resource(&self) -> &str {
    self.default_resource.as_deref().unwrap_or("books")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
auth:
  url: https://auth.example.com/api/v1/auth
resources:
  books: { url: "https://books.example.com" }
  messages: { url: "https://contact.example.com" }
  newspapers: { url: "https://news.example.com" }
  courses: { url: "https://courses.example.com" }
"#;

  #[test]
  fn test_defaults() {
    let config = Config::parse(MINIMAL).unwrap();
    assert_eq!(config.title(), "ktadmin");
    assert_eq!(config.default_resource(), "books");
    assert_eq!(config.list.page_size, 10);
    assert_eq!(config.list.sort, "-createdAt");
    assert!(!config.list.reset_page_on_search);
    assert!(config.headers.is_empty());
    assert_eq!(config.resources.messages.url, "https://contact.example.com");
  }

  #[test]
  fn test_full_config() {
    let yaml = format!(
      "{}{}",
      MINIMAL,
      r#"
title: Knowledge Think
default_resource: courses
list:
  page_size: 25
  reset_page_on_search: true
headers:
  ngrok-skip-browser-warning: "true"
"#
    );
    let config = Config::parse(&yaml).unwrap();
    assert_eq!(config.title(), "Knowledge Think");
    assert_eq!(config.default_resource(), "courses");
    assert_eq!(config.list.page_size, 25);
    assert_eq!(config.list.sort, "-createdAt");
    assert!(config.list.reset_page_on_search);
    assert_eq!(
      config.headers.get("ngrok-skip-browser-warning").map(String::as_str),
      Some("true")
    );
  }

  #[test]
  fn test_zero_page_size_rejected() {
    let yaml = format!("{}list:\n  page_size: 0\n", MINIMAL);
    assert!(Config::parse(&yaml).is_err());
  }

  #[test]
  fn test_unknown_default_resource_rejected() {
    let yaml = format!("{}default_resource: users\n", MINIMAL);
    let err = Config::parse(&yaml).unwrap_err();
    assert!(err.to_string().contains("Unknown resource 'users'"));
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/ktadmin.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
