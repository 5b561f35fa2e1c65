pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod display;
pub mod event;
pub mod grid;
pub mod render;
pub mod store;
pub mod timefmt;
pub mod view;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::store::EventStore;
use crate::view::CalendarView;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.almanacrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  if let Some(width) = cli.width {
    cfg.apply_overrides([(
      "viewport.width".to_string(),
      width.to_string()
    )]);
  }

  let store = match cli
    .fixture
    .or_else(|| cfg.fixture_path())
  {
    | Some(path) => {
      EventStore::load_fixture(&path)?
    }
    | None => EventStore::bundled()?
  };

  let today = datetime::today_in(
    datetime::resolve_timezone(&cfg)
  );
  let mut view = CalendarView::new(
    store,
    today,
    cfg.viewport()?,
    cfg.cell_limits()?
  )
  .context(
    "failed to build calendar view"
  )?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut view,
    &renderer,
    inv,
    io::stdin().lock(),
    io::stdout().lock()
  )?;

  info!("done");
  Ok(())
}
