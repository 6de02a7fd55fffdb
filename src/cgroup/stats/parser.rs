//! Generic traits for parsing cgroup v2 stat files into structured types.
//!
//! Two file shapes cover everything this crate reads from the cgroup
//! filesystem:
//!
//! - [`KeyValueStat`] for multi-line key/value files (`cpu.stat`, `io.stat`).
//!   Implementors declare how pairs are delimited and provide a static map
//!   from known keys to handler functions; unknown keys are ignored.
//! - [`SingleLineStat`] for files holding one scalar (`memory.current`).
//!
//! Handlers receive parsed `u64` values and may either set or accumulate,
//! which is how `io.stat` sums its counters across device lines.

use std::collections::HashMap;
use std::io::BufRead;

use super::StatParseError;

/// A parser for multi-line key/value stat files.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `Some(char)`, each pair is a single token joined by that character
    /// (`rbytes=1024`). If `None`, keys and values alternate as separate
    /// whitespace-separated tokens (`usage_usec 1000000`).
    const SPLIT_CHAR: Option<char>;

    /// Whitespace-separated tokens to discard at the start of each line,
    /// e.g. the device number column of `io.stat`.
    const SKIP_VALUES: usize;

    /// Map from known field names to functions that apply a parsed value to
    /// the struct.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Reads the whole buffer, applying every recognized key/value pair.
    ///
    /// # Errors
    ///
    /// Fails when reading fails, or with an `InvalidData` error wrapping a
    /// [`StatParseError`] when a known key carries a non-numeric value.
    /// Unknown keys and tokens without a delimiter are skipped.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut tokens = line.split_whitespace().skip(Self::SKIP_VALUES);

            if let Some(split_char) = Self::SPLIT_CHAR {
                for token in tokens {
                    if let Some((key, value)) = token.split_once(split_char) {
                        Self::apply(&mut stat, key, value, lineno, handlers)?;
                    }
                }
            } else {
                while let (Some(key), Some(value)) = (tokens.next(), tokens.next()) {
                    Self::apply(&mut stat, key, value, lineno, handlers)?;
                }
            }

            line.clear();
        }

        Ok(stat)
    }

    /// Parses one value and routes it through the handler for `key`, if any.
    fn apply(
        stat: &mut Self,
        key: &str,
        value: &str,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
    ) -> std::io::Result<()> {
        if let Some(handler) = handlers.get(key) {
            let parsed = value
                .parse::<u64>()
                .map_err(|source| StatParseError::InvalidKeyValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    line: lineno,
                    source,
                })?;
            handler(stat, parsed);
        }

        Ok(())
    }
}

/// A parser for files that hold a single scalar value on one line.
pub trait SingleLineStat: Sized + Default {
    /// Parses the single line of the file.
    ///
    /// # Errors
    ///
    /// Fails when reading fails or the value cannot be parsed, in which case
    /// the error has kind `InvalidData` and wraps a [`StatParseError`].
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self>;
}
