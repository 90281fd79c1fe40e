use crate::errors::Error;
use nom::bytes::complete::take;
use nom::{Err, IResult};

pub(crate) type AMFResult<'a, T> = IResult<&'a [u8], T, Error<'a>>;

/// Take `length` bytes from the input and decode them as UTF-8
pub(crate) fn take_str(i: &[u8], length: u32) -> AMFResult<'_, &str> {
    let (i, bytes) = take(length)(i)?;
    let s = std::str::from_utf8(bytes).map_err(|_| Err::Error(Error::InvalidUtf8))?;
    Ok((i, s))
}
