use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::error::{AppError, AppResult};

use super::BenchArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<(BenchArgs, ArgMatches)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = BenchArgs::command().try_get_matches_from(args)?;
    let parsed = BenchArgs::from_arg_matches(&matches).map_err(AppError::from)?;
    Ok((parsed, matches))
}
