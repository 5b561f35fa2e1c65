use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::display::{
  CellLimits,
  DEFAULT_BREAKPOINT,
  DEFAULT_NARROW_LIMIT,
  DEFAULT_WIDE_LIMIT,
  DEFAULT_WIDTH,
  Viewport
};

const RC_ENV_VAR: &str = "ALMANACRC";
const RC_FILE_NAME: &str = ".almanacrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("color", "on".to_string()),
      (
        "default.command",
        "month".to_string()
      ),
      (
        "viewport.width",
        DEFAULT_WIDTH.to_string()
      ),
      (
        "viewport.breakpoint",
        DEFAULT_BREAKPOINT.to_string()
      ),
      (
        "cell.limit.wide",
        DEFAULT_WIDE_LIMIT.to_string()
      ),
      (
        "cell.limit.narrow",
        DEFAULT_NARROW_LIMIT.to_string()
      )
    ] {
      map.insert(key.to_string(), value);
    }

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading almanacrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no almanacrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|raw| {
        parse_bool(raw).ok_or_else(|| {
          anyhow!(
            "invalid value for {key}: \
             {raw}"
          )
        })
      })
      .transpose()
  }

  pub fn get_parsed<T>(
    &self,
    key: &str
  ) -> anyhow::Result<Option<T>>
  where
    T: FromStr,
    T::Err: std::fmt::Display
  {
    self
      .map
      .get(key)
      .map(|raw| {
        raw.trim().parse::<T>().map_err(
          |err| {
            anyhow!(
              "invalid value for \
               {key}: {raw} ({err})"
            )
          }
        )
      })
      .transpose()
  }

  pub fn viewport(
    &self
  ) -> anyhow::Result<Viewport> {
    Ok(Viewport {
      width:      self
        .get_parsed("viewport.width")?
        .unwrap_or(DEFAULT_WIDTH),
      breakpoint: self
        .get_parsed(
          "viewport.breakpoint"
        )?
        .unwrap_or(DEFAULT_BREAKPOINT)
    })
  }

  pub fn cell_limits(
    &self
  ) -> anyhow::Result<CellLimits> {
    Ok(CellLimits {
      wide:   self
        .get_parsed("cell.limit.wide")?
        .unwrap_or(DEFAULT_WIDE_LIMIT),
      narrow: self
        .get_parsed(
          "cell.limit.narrow"
        )?
        .unwrap_or(DEFAULT_NARROW_LIMIT)
    })
  }

  /// Fixture file to seed the store
  /// from; `None` means the bundled one.
  pub fn fixture_path(
    &self
  ) -> Option<PathBuf> {
    self
      .get("fixture.location")
      .filter(|raw| !raw.trim().is_empty())
      .map(|raw| {
        expand_tilde(Path::new(
          raw.trim()
        ))
      })
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping almanacrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use tempfile::NamedTempFile;

  use super::*;

  #[test]
  fn defaults_cover_display_settings() {
    let cfg = Config::default();
    assert_eq!(
      cfg.viewport().expect("viewport"),
      Viewport::default()
    );
    assert_eq!(
      cfg
        .cell_limits()
        .expect("limits"),
      CellLimits::default()
    );
    assert_eq!(cfg.fixture_path(), None);
    assert_eq!(
      cfg
        .get_bool("color")
        .expect("color flag"),
      Some(true)
    );
  }

  #[test]
  fn rc_file_and_overrides_apply_in_order(
  ) {
    let mut file = NamedTempFile::new()
      .expect("temp rc");
    writeln!(
      file,
      "# display\nviewport.width = \
       600 # phone\ncell.limit.narrow=3"
    )
    .expect("write rc");

    let mut cfg =
      Config::load(Some(file.path()))
        .expect("load rc");
    assert_eq!(cfg.loaded_files.len(), 1);
    assert!(
      cfg
        .viewport()
        .expect("viewport")
        .is_narrow()
    );
    assert_eq!(
      cfg
        .cell_limits()
        .expect("limits")
        .narrow,
      3
    );

    cfg.apply_overrides([(
      "rc.viewport.width".to_string(),
      "1000".to_string()
    )]);
    assert_eq!(
      cfg
        .viewport()
        .expect("viewport")
        .width,
      1000
    );
  }

  #[test]
  fn malformed_values_are_reported() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "cell.limit.wide".to_string(),
      "lots".to_string()
    )]);
    let err = cfg
      .cell_limits()
      .expect_err("bad limit");
    assert!(
      err
        .to_string()
        .contains("cell.limit.wide")
    );
  }

  #[test]
  fn bool_values_parse_strictly() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "color".to_string(),
      "Off".to_string()
    )]);
    assert_eq!(
      cfg
        .get_bool("color")
        .expect("color flag"),
      Some(false)
    );

    cfg.apply_overrides([(
      "color".to_string(),
      "sometimes".to_string()
    )]);
    assert!(
      cfg.get_bool("color").is_err()
    );
    assert_eq!(
      cfg
        .get_bool("missing")
        .expect("absent key"),
      None
    );
  }

  #[test]
  fn malformed_lines_fail_loading() {
    let mut file = NamedTempFile::new()
      .expect("temp rc");
    writeln!(file, "no equals here")
      .expect("write rc");
    assert!(
      Config::load(Some(file.path()))
        .is_err()
    );
  }
}
