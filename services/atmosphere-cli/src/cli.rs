//! Command-line parsing
//!
//! Global flags may appear before or after the subcommand:
//! `--config PATH`, `--endpoint URL`.

use crate::error::{Error, Result};

pub const USAGE: &str = "\
Usage:
  atmosphere [--config PATH] [--endpoint URL] acquire --pool POOL --requester NAME [--timeout-secs N]
  atmosphere [--config PATH] [--endpoint URL] release ALLOCATION_ID OUTCOME
  atmosphere --help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Acquire {
        pool: String,
        requester: String,
        timeout_secs: Option<u64>,
    },
    Release {
        allocation_id: String,
        outcome: String,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<String>,
    pub endpoint: Option<String>,
    pub command: Command,
}

/// Parse arguments (without the program name).
pub fn parse(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut endpoint = None;
    let mut pool = None;
    let mut requester = None;
    let mut timeout_secs = None;
    let mut positional: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(Args {
                    config,
                    endpoint,
                    command: Command::Help,
                });
            }
            "--config" => config = Some(value(&mut iter, arg)?),
            "--endpoint" => endpoint = Some(value(&mut iter, arg)?),
            "--pool" => pool = Some(value(&mut iter, arg)?),
            "--requester" => requester = Some(value(&mut iter, arg)?),
            "--timeout-secs" => {
                let raw = value(&mut iter, arg)?;
                let secs = raw.parse::<u64>().map_err(|_| {
                    Error::Usage(format!("--timeout-secs expects a number of seconds, got {raw}"))
                })?;
                if secs == 0 {
                    return Err(Error::Usage("--timeout-secs must be greater than 0".into()));
                }
                timeout_secs = Some(secs);
            }
            flag if flag.starts_with("--") => {
                return Err(Error::Usage(format!("unknown flag: {flag}")));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("acquire") => Command::Acquire {
            pool: pool.ok_or_else(|| Error::Usage("acquire requires --pool".into()))?,
            requester: requester
                .ok_or_else(|| Error::Usage("acquire requires --requester".into()))?,
            timeout_secs,
        },
        Some("release") => {
            let allocation_id = positional
                .next()
                .ok_or_else(|| Error::Usage("release requires an allocation id".into()))?;
            let outcome = positional
                .next()
                .ok_or_else(|| Error::Usage("release requires an outcome".into()))?;
            Command::Release {
                allocation_id,
                outcome,
            }
        }
        Some(other) => return Err(Error::Usage(format!("unknown command: {other}"))),
        None => return Err(Error::Usage("missing command".into())),
    };

    if let Some(extra) = positional.next() {
        return Err(Error::Usage(format!("unexpected argument: {extra}")));
    }

    Ok(Args {
        config,
        endpoint,
        command,
    })
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::Usage(format!("{flag} requires a value")))
}
