#![allow(clippy::too_many_arguments, clippy::type_complexity)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::arguments::Arguments,
  anyhow::Error,
  clap::Parser,
  std::{
    env, process,
    sync::atomic::{self, AtomicBool},
  },
};

pub use crate::{
  config::{Config, Network},
  inscription_id::InscriptionId,
};

mod arguments;
pub mod chain;
pub mod config;
pub mod datastore;
pub mod index;
pub mod inscription_id;
mod logger;
mod options;
pub mod protocol;
mod subcommand;

type Result<T = (), E = Error> = std::result::Result<T, E>;

static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

pub fn main() {
  let args = Arguments::parse();
  let log_dir = match args.options.log_dir() {
    Ok(d) => d,
    Err(e) => panic!("get log file error: {}", e),
  };
  if let Err(e) = std::fs::create_dir_all(&log_dir) {
    panic!("create log dir error: {}", e);
  }
  if let Err(e) = logger::init(args.options.log_level(), &log_dir) {
    panic!("initialize logger error: {}", e);
  }

  ctrlc::set_handler(move || {
    if SHUTTING_DOWN.fetch_or(true, atomic::Ordering::Relaxed) {
      process::exit(1);
    }

    println!("Shutting down gracefully. Press <CTRL-C> again to shutdown immediately.");
  })
  .expect("Error setting <CTRL-C> handler");

  if let Err(err) = args.run() {
    log::error!("indexer stopped: {err}");
    eprintln!("error: {err}");
    err
      .chain()
      .skip(1)
      .for_each(|cause| eprintln!("because: {cause}"));
    if env::var_os("RUST_BACKTRACE")
      .map(|val| val == "1")
      .unwrap_or_default()
    {
      eprintln!("{}", err.backtrace());
    }

    process::exit(1);
  }
}
