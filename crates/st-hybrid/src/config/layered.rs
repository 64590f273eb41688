// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Which file a configuration change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigLayer {
    Base,
    Site,
    Run,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLayer::Base => write!(f, "base"),
            ConfigLayer::Site => write!(f, "site"),
            ConfigLayer::Run => write!(f, "run"),
        }
    }
}

/// A leaf that a layer added, changed or removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigDiffEvent {
    pub layer: ConfigLayer,
    pub path: String,
    pub previous: Option<Value>,
    pub current: Option<Value>,
}

/// Collection of configuration layers that are merged in order.
#[derive(Clone, Debug, Default)]
pub struct ConfigLayering {
    pub base: Option<PathBuf>,
    pub site: Option<PathBuf>,
    pub run: Option<PathBuf>,
}

impl ConfigLayering {
    /// Discovers `base.toml`, `site.toml` and `run.json` under
    /// `SPIRAL_CONFIG_ROOT` (default `~/.spiraltorch/config`). Each file can be
    /// redirected with `SPIRAL_CONFIG_BASE`, `SPIRAL_CONFIG_SITE` or
    /// `SPIRAL_CONFIG_RUN`. Missing files are skipped.
    pub fn discover() -> Self {
        let root = std::env::var("SPIRAL_CONFIG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_root());

        ConfigLayering {
            base: layer_path("SPIRAL_CONFIG_BASE", &root, "base.toml"),
            site: layer_path("SPIRAL_CONFIG_SITE", &root, "site.toml"),
            run: layer_path("SPIRAL_CONFIG_RUN", &root, "run.json"),
        }
    }

    /// Layering rooted at `root` without consulting the environment.
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        ConfigLayering {
            base: existing_path(root.join("base.toml")),
            site: existing_path(root.join("site.toml")),
            run: existing_path(root.join("run.json")),
        }
    }

    pub fn with_base<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.base = Some(path.into());
        self
    }

    pub fn with_site<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.site = Some(path.into());
        self
    }

    pub fn with_run<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.run = Some(path.into());
        self
    }
}

fn layer_path(var: &str, root: &Path, file: &str) -> Option<PathBuf> {
    std::env::var(var)
        .map(PathBuf::from)
        .ok()
        .or_else(|| Some(root.join(file)))
        .and_then(existing_path)
}

fn existing_path(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

fn default_root() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".spiraltorch").join("config"),
        None => PathBuf::from("."),
    }
}

/// Result of merging layered configuration files.
#[derive(Clone, Debug)]
pub struct LayeredConfig {
    layering: ConfigLayering,
    value: Value,
    events: Vec<ConfigDiffEvent>,
}

impl LayeredConfig {
    /// Loads the configured layers, merging base → site → run.
    pub fn load(layering: ConfigLayering) -> Result<Self, LayeredConfigError> {
        let mut value = Value::Object(Default::default());
        let mut events = Vec::new();

        if let Some(path) = layering.base.as_ref() {
            if let Some(layer) = load_toml(path)? {
                apply_layer(&mut value, &layer, ConfigLayer::Base, &mut events);
            }
        }
        if let Some(path) = layering.site.as_ref() {
            if let Some(layer) = load_toml(path)? {
                apply_layer(&mut value, &layer, ConfigLayer::Site, &mut events);
            }
        }
        if let Some(path) = layering.run.as_ref() {
            if let Some(layer) = load_json(path)? {
                apply_layer(&mut value, &layer, ConfigLayer::Run, &mut events);
            }
        }

        for event in &events {
            tracing::debug!(
                layer = %event.layer,
                path = %event.path,
                current = ?event.current,
                "config value applied"
            );
        }

        Ok(LayeredConfig {
            layering,
            value,
            events,
        })
    }

    /// Empty configuration; every typed section falls back to its default.
    pub fn empty() -> Self {
        LayeredConfig {
            layering: ConfigLayering::default(),
            value: Value::Object(Default::default()),
            events: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn layering(&self) -> &ConfigLayering {
        &self.layering
    }

    pub fn events(&self) -> &[ConfigDiffEvent] {
        &self.events
    }

    /// Extracts a typed view of a nested section, `None` when any key on the
    /// path is missing.
    pub fn section<T>(&self, path: &[&str]) -> Result<Option<T>, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        let mut node = &self.value;
        for key in path {
            match node {
                Value::Object(map) => match map.get(*key) {
                    Some(value) => node = value,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            }
        }
        serde_json::from_value(node.clone()).map(Some)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayeredConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid section {section}: {source}")]
    Section {
        section: String,
        #[source]
        source: serde_json::Error,
    },
}

fn read_layer(path: &Path) -> Result<Option<String>, LayeredConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| LayeredConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn load_toml(path: &Path) -> Result<Option<Value>, LayeredConfigError> {
    let Some(text) = read_layer(path)? else {
        return Ok(None);
    };
    let value: toml::Value = toml::from_str(&text).map_err(|source| LayeredConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_value(value)
        .map(Some)
        .map_err(|source| LayeredConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn load_json(path: &Path) -> Result<Option<Value>, LayeredConfigError> {
    let Some(text) = read_layer(path)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| LayeredConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn apply_layer(
    dest: &mut Value,
    layer: &Value,
    kind: ConfigLayer,
    events: &mut Vec<ConfigDiffEvent>,
) {
    let before = dest.clone();
    merge(dest, layer);
    diff(&before, dest, &mut Vec::new(), kind, events);
}

fn merge(dest: &mut Value, src: &Value) {
    match (dest, src) {
        (Value::Object(dest_map), Value::Object(src_map)) => {
            for (key, value) in src_map {
                match dest_map.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dest_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (dest_slot, src_value) => {
            *dest_slot = src_value.clone();
        }
    }
}

fn diff(
    before: &Value,
    after: &Value,
    path: &mut Vec<String>,
    layer: ConfigLayer,
    out: &mut Vec<ConfigDiffEvent>,
) {
    if before == after {
        return;
    }

    match (before, after) {
        (Value::Object(before_map), Value::Object(after_map)) => {
            let mut keys: Vec<&String> = before_map.keys().chain(after_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                path.push(key.clone());
                let before_child = before_map.get(key).unwrap_or(&Value::Null);
                let after_child = after_map.get(key).unwrap_or(&Value::Null);
                diff(before_child, after_child, path, layer, out);
                path.pop();
            }
        }
        _ => out.push(ConfigDiffEvent {
            layer,
            path: path.join("."),
            previous: (!before.is_null()).then(|| before.clone()),
            current: (!after.is_null()).then(|| after.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn merges_layers_and_reports_diffs() {
        let root = TempDir::new().unwrap();

        fs::write(
            root.path().join("base.toml"),
            r#"
            [hybrid]
            iterations = 100
            fast_step_ms = 5
            "#,
        )
        .unwrap();
        fs::write(
            root.path().join("site.toml"),
            r#"
            [hybrid]
            fast_step_ms = 2
            op = "simpleop"
            "#,
        )
        .unwrap();
        fs::write(root.path().join("run.json"), r#"{"hybrid":{"iterations":7}}"#).unwrap();

        let stacked = LayeredConfig::load(ConfigLayering::in_dir(root.path())).unwrap();

        let hybrid: Value = stacked.section::<Value>(&["hybrid"]).unwrap().unwrap();
        assert_eq!(hybrid["iterations"], Value::from(7));
        assert_eq!(hybrid["fast_step_ms"], Value::from(2));
        assert_eq!(hybrid["op"], Value::from("simpleop"));

        let events = stacked.events();
        assert!(events.iter().any(|event| {
            event.layer == ConfigLayer::Run
                && event.path == "hybrid.iterations"
                && event.previous == Some(Value::from(100))
                && event.current == Some(Value::from(7))
        }));
        assert!(events.iter().any(|event| {
            event.layer == ConfigLayer::Site
                && event.path == "hybrid.op"
                && event.previous.is_none()
        }));
    }

    #[test]
    fn missing_sections_are_none() {
        let config = LayeredConfig::empty();
        assert!(config.section::<Value>(&["hybrid"]).unwrap().is_none());
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let root = TempDir::new().unwrap();
        let base = root.path().join("base.toml");
        fs::write(&base, "[hybrid\n").unwrap();
        let err = LayeredConfig::load(ConfigLayering::default().with_base(&base)).unwrap_err();
        assert!(matches!(err, LayeredConfigError::Toml { ref path, .. } if path == &base));
    }
}
