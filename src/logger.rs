use crate::Result;
use log::LevelFilter;
use log4rs::{
  append::{
    console::ConsoleAppender,
    rolling_file::{
      policy::compound::{
        roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
      },
      RollingFileAppender,
    },
  },
  config::{Appender, Config, Logger, Root},
  encode::pattern::PatternEncoder,
};
use std::path::Path;

const LOG_FILE: &str = "doginals.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l})} [{T}] {t}: {m}{n}";
const LOG_FILE_SIZE: u64 = 100 * 1024 * 1024;
const LOG_ARCHIVES: u32 = 20;

/// Logs to the console and to a size-rolled file in `log_dir`. Rolled files
/// are gzip-archived.
pub(crate) fn init(level: LevelFilter, log_dir: &Path) -> Result<log4rs::Handle> {
  let console = ConsoleAppender::builder()
    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
    .build();

  let archive = log_dir.join(format!("{LOG_FILE}.{{}}.gz"));
  let roller = FixedWindowRoller::builder().build(&archive.to_string_lossy(), LOG_ARCHIVES)?;
  let policy = CompoundPolicy::new(
    Box::new(SizeTrigger::new(LOG_FILE_SIZE)),
    Box::new(roller),
  );
  let file = RollingFileAppender::builder()
    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
    .build(log_dir.join(LOG_FILE), Box::new(policy))?;

  let config = Config::builder()
    .appender(Appender::builder().build("console", Box::new(console)))
    .appender(Appender::builder().build("file", Box::new(file)))
    .logger(Logger::builder().build("bitcoincore_rpc", LevelFilter::Warn))
    .build(
      Root::builder()
        .appender("console")
        .appender("file")
        .build(level),
    )?;

  Ok(log4rs::init_config(config)?)
}
