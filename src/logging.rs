use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    fmt::{format::FmtSpan, Layer},
    prelude::*,
};

use crate::Args;

pub fn init(args: &Args) -> Result<()> {
    let log_level_filter = parse_level_filter(&args.log_level)?;

    let default_fmt_layer = Layer::default();
    let fmt = match args.json {
        true => default_fmt_layer
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(log_level_filter)
            .boxed(),
        false => default_fmt_layer
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(log_level_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(fmt).try_init()?;
    Ok(())
}

fn parse_level_filter(log_level: &str) -> Result<LevelFilter> {
    let level = Level::from_str(log_level)
        .with_context(|| format!("Unknown log level \"{log_level}\""))?;
    Ok(LevelFilter::from_level(level))
}
